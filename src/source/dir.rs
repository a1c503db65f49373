use super::{RetrievalError, Source};
use crate::codec::CharsetDecoder;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use async_trait::async_trait;
use encoding_rs::Encoding;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Dashboard tables are small; 64 KiB keeps most of them to a single read.
const READ_BUFFER: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zst") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Reads tables from a local directory, e.g. a checked-out `data/` tree.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    charset: &'static Encoding,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            charset: encoding_rs::UTF_8,
        }
    }

    /// Charset of the files under `root`; non-UTF-8 text is transcoded while reading.
    pub fn with_charset(mut self, charset: &'static Encoding) -> Self {
        self.charset = charset;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `locator` under the root. Absolute paths and `..` are rejected so a
    /// registry entry cannot read outside the data directory.
    fn resolve(&self, locator: &str) -> Result<PathBuf, RetrievalError> {
        let rel = Path::new(locator);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if locator.is_empty() || escapes {
            return Err(RetrievalError::InvalidLocator(locator.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn text_reader<R>(&self, raw: R, compression: Compression) -> Box<dyn AsyncRead + Unpin + Send>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = BufReader::with_capacity(READ_BUFFER, raw);
        let decompressed: Box<dyn AsyncRead + Unpin + Send> = match compression {
            Compression::Gzip => Box::new(GzipDecoder::new(buf)),
            Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
            Compression::None => Box::new(buf),
        };

        if self.charset == encoding_rs::UTF_8 {
            decompressed
        } else {
            let framed = FramedRead::new(decompressed, CharsetDecoder::new(self.charset));
            Box::new(StreamReader::new(framed))
        }
    }
}

#[async_trait]
impl Source for DirSource {
    async fn fetch(&self, locator: &str) -> Result<String, RetrievalError> {
        let path = self.resolve(locator)?;
        let io_err = |source: std::io::Error| RetrievalError::Io {
            locator: locator.to_string(),
            source,
        };

        let compression = Compression::from_path(&path);
        debug!(path = %path.display(), ?compression, charset = self.charset.name(), "reading table");
        let file = File::open(&path).await.map_err(io_err)?;
        let mut reader = self.text_reader(file, compression);

        let mut text = String::new();
        reader.read_to_string(&mut text).await.map_err(io_err)?;
        if let Some(stripped) = text.strip_prefix('\u{feff}') {
            text = stripped.to_string();
        }
        Ok(text)
    }
}
