use crate::dataset::{Dataset, Row};
use memchr::memchr_iter;
use std::sync::Arc;

/// Parse dashboard CSV text into a [`Dataset`].
///
/// Line oriented and permissive: the first line is the header, blank lines are
/// skipped, short lines leave trailing cells absent and long lines lose their
/// extra fields. Quoting is limited to stripping one `"` at each end of a
/// trimmed field; commas or newlines inside quotes are not supported.
pub fn parse(text: &str) -> Dataset {
    let text = text.trim();
    if text.is_empty() {
        return Dataset::default();
    }

    let mut lines = split_lines(text);
    let header_line = lines.next().unwrap_or_default();
    let headers: Arc<[String]> = split_fields(header_line)
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into();

    let rows = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = split_fields(line);
            let cells = (0..headers.len())
                .map(|_| fields.next().map(str::to_string))
                .collect();
            Row::new(headers.clone(), cells)
        })
        .collect();

    Dataset::from_parts(headers, rows)
}

/// Split on `\n` using memchr; `\r` is left in place and removed by field trimming.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    memchr_iter(b'\n', bytes)
        .chain(std::iter::once(bytes.len()))
        .map(move |end| {
            // '\n' is ASCII, so both ends land on char boundaries
            let line = &text[start..end];
            start = end + 1;
            line
        })
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(clean_field)
}

fn clean_field(field: &str) -> &str {
    let field = field.trim();
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}
