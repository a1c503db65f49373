use crate::IngestResult;
use crc32fast::Hasher as Crc32;
use csv_async::AsyncWriterBuilder;
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// One data line keyed by the dataset header.
///
/// Cells are positional against the shared header; a cell is `None` when the
/// input line was shorter than the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    headers: Arc<[String]>,
    cells: Vec<Option<String>>,
}

impl Row {
    pub(crate) fn new(headers: Arc<[String]>, mut cells: Vec<Option<String>>) -> Self {
        cells.resize(headers.len(), None);
        Self { headers, cells }
    }

    /// Cell for `column`. When a header name repeats, the last column wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().rposition(|h| h == column)?;
        self.cells[idx].as_deref()
    }

    /// First non-blank cell among `columns`, for tables whose header naming drifted.
    pub fn first_of(&self, columns: &[&str]) -> Option<&str> {
        columns
            .iter()
            .find_map(|c| self.get(c).filter(|v| !v.is_empty()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    /// `(column, cell)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Option::as_deref))
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }
}

/// Header plus rows of one CSV resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Arc<[String]>,
    rows: Vec<Row>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            headers: Arc::from(Vec::<String>::new()),
            rows: Vec::new(),
        }
    }
}

impl Dataset {
    pub(crate) fn from_parts(headers: Arc<[String]>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Build a dataset from literal values. Rows are aligned to the header the
    /// same way parsed lines are.
    pub fn from_literal<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers: Arc<[String]> = headers
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .into();
        let rows = rows
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter().map(|c| Some(c.into())).collect::<Vec<_>>();
                cells.truncate(headers.len());
                Row::new(headers.clone(), cells)
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Columns of `expected` missing from this dataset's header.
    pub fn missing_columns<'a>(&self, expected: &'a [String]) -> Vec<&'a str> {
        expected
            .iter()
            .filter(|c| !self.has_column(c))
            .map(String::as_str)
            .collect()
    }

    /// CRC32 over header and cells. Fields are separated by `0x1f`, rows by `0x1e`,
    /// and absent cells hash as `0x00` so they differ from empty strings.
    pub fn fingerprint(&self) -> u32 {
        let mut crc = Crc32::new();
        for (i, h) in self.headers.iter().enumerate() {
            if i > 0 {
                crc.update(&[0x1f]);
            }
            crc.update(h.as_bytes());
        }
        for row in &self.rows {
            crc.update(&[0x1e]);
            for (i, cell) in row.cells.iter().enumerate() {
                if i > 0 {
                    crc.update(&[0x1f]);
                }
                match cell {
                    Some(c) => crc.update(c.as_bytes()),
                    None => crc.update(&[0x00]),
                }
            }
        }
        crc.finalize()
    }

    /// Write the dataset as CSV. Absent cells are written empty.
    ///
    /// Fields containing commas or quotes get standard CSV quoting, which the
    /// line parser in this crate does not read back.
    pub async fn write_csv<W>(&self, writer: W) -> IngestResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut wtr = AsyncWriterBuilder::new().create_writer(writer);
        wtr.write_record(self.headers.iter()).await?;
        for row in &self.rows {
            wtr.write_record(row.cells.iter().map(|c| c.as_deref().unwrap_or("")))
                .await?;
        }
        wtr.flush().await?;
        Ok(())
    }
}
