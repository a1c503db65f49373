use bytes::{Buf, BytesMut};
use encoding_rs::Encoding;
use std::io;
use tokio_util::codec::Decoder;
use tracing::warn;

/// Streaming decoder from a legacy charset (e.g. windows-1252) to UTF-8 chunks.
///
/// Malformed input is replaced with U+FFFD and reported once per stream.
pub struct CharsetDecoder {
    decoder: encoding_rs::Decoder,
    replaced: usize,
}

impl CharsetDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
            replaced: 0,
        }
    }

    fn convert(&mut self, src: &[u8], last: bool) -> (usize, BytesMut) {
        let cap = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or_else(|| src.len() * 3 + 4);
        let mut out = String::with_capacity(cap);
        let (_result, read, had_errors) = self.decoder.decode_to_string(src, &mut out, last);
        if had_errors {
            self.replaced += 1;
            if self.replaced == 1 {
                warn!(
                    encoding = self.decoder.encoding().name(),
                    "malformed input replaced while transcoding"
                );
            }
        }
        (read, BytesMut::from(out.as_bytes()))
    }
}

impl Decoder for CharsetDecoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let (read, out) = self.convert(src, false);
        if read == 0 && out.is_empty() {
            return Ok(None);
        }
        src.advance(read);
        Ok(Some(out))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.is_empty() {
            return Ok(None);
        }
        let (_read, out) = self.convert(buf, true);
        buf.clear();
        Ok((!out.is_empty()).then_some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_1252_is_transcoded() {
        let mut dec = CharsetDecoder::new(encoding_rs::WINDOWS_1252);
        let mut src = BytesMut::from(&b"Kategori\nLaki-laki \xe9"[..]);
        let out = dec.decode(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "Kategori\nLaki-laki é");
        assert!(src.is_empty());
        assert_eq!(dec.replaced, 0);
    }
}
