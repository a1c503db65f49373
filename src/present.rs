//! Helpers for presentation sinks: lenient numbers, interpretation bands, and
//! the plain-text sink used by the command line tools.

use crate::dataset::{Dataset, Row};
use crate::sink::Sink;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// Cell as a number. Missing, non-numeric and non-finite cells are unavailable.
pub fn number(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn number_or(cell: Option<&str>, default: f64) -> f64 {
    number(cell).unwrap_or(default)
}

/// `value` with `digits` decimals, or `N/A`.
pub fn fixed(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{v:.digits$}"),
        None => "N/A".to_string(),
    }
}

/// Reliability interpretation of a McDonald's Omega coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OmegaBand {
    Poor,
    Questionable,
    Acceptable,
    Good,
    Excellent,
}

impl OmegaBand {
    pub fn classify(omega: f64) -> Self {
        if omega >= 0.90 {
            OmegaBand::Excellent
        } else if omega >= 0.80 {
            OmegaBand::Good
        } else if omega >= 0.70 {
            OmegaBand::Acceptable
        } else if omega >= 0.60 {
            OmegaBand::Questionable
        } else {
            OmegaBand::Poor
        }
    }

    /// Band for a raw cell; `None` when the cell is not a number.
    pub fn of_cell(cell: Option<&str>) -> Option<Self> {
        number(cell).map(Self::classify)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OmegaBand::Excellent => "Excellent",
            OmegaBand::Good => "Good",
            OmegaBand::Acceptable => "Acceptable",
            OmegaBand::Questionable => "Questionable",
            OmegaBand::Poor => "Poor",
        }
    }
}

impl fmt::Display for OmegaBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Headline numbers shown above the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStats {
    pub respondents: Option<u64>,
    pub aspects: usize,
    pub mean_omega: Option<f64>,
}

impl KeyStats {
    pub fn compute(reliability: &Dataset, descriptive: &Dataset) -> Self {
        let respondents = descriptive
            .rows()
            .first()
            .and_then(|row| number(row.first_of(&["n", "N"])))
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64);

        let omegas: Vec<f64> = reliability
            .rows()
            .iter()
            .filter_map(|row| number(row.get("Omega")))
            .collect();
        let mean_omega =
            (!omegas.is_empty()).then(|| omegas.iter().sum::<f64>() / omegas.len() as f64);

        Self {
            respondents,
            aspects: reliability.len(),
            mean_omega,
        }
    }
}

impl fmt::Display for KeyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let respondents = self
            .respondents
            .map(group_thousands)
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(f, "Respondents:      {respondents}")?;
        writeln!(f, "Aspects:          {}", self.aspects)?;
        write!(f, "Mean Omega:       {}", fixed(self.mean_omega, 3))?;
        if let Some(band) = self.mean_omega.map(OmegaBand::classify) {
            write!(f, " ({band})")?;
        }
        Ok(())
    }
}

/// One category of a demographic breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

const LABEL_COLUMNS: &[&str] = &["Kategori", "JenisKelamin", "Gender", "Pendidikan", "Education"];
const COUNT_COLUMNS: &[&str] = &["Frekuensi", "N", "Frequency"];
const PERCENT_COLUMNS: &[&str] = &["Persentase.Freq", "Percentage", "Percent"];

/// Demographic rows as label/count/percent, across the column names the tables
/// have used over time. Unreadable counts and percents become zero.
pub fn category_shares(dataset: &Dataset) -> Vec<CategoryShare> {
    dataset
        .rows()
        .iter()
        .map(|row| CategoryShare {
            label: row.first_of(LABEL_COLUMNS).unwrap_or_default().to_string(),
            count: number_or(row.first_of(COUNT_COLUMNS), 0.0).max(0.0) as u64,
            percent: number_or(row.first_of(PERCENT_COLUMNS), 0.0),
        })
        .collect()
}

/// `1234567` as `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Writes each dataset it receives as an aligned text table.
///
/// Datasets with an `Omega` column get an extra `Interpretation` column.
pub struct TextSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn render(name: &str, dataset: &Dataset) -> String {
        let interpret = dataset.has_column("Omega");
        let mut header: Vec<String> = dataset.headers().to_vec();
        if interpret {
            header.push("Interpretation".to_string());
        }

        let body: Vec<Vec<String>> = dataset
            .rows()
            .iter()
            .map(|row| Self::render_row(row, interpret))
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for line in &body {
            for (w, cell) in widths.iter_mut().zip(line) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut text = format!("== {name} ({} rows)\n", dataset.len());
        for line in std::iter::once(&header).chain(body.iter()) {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect();
            text.push_str(cells.join("  ").trim_end());
            text.push('\n');
        }
        text
    }

    fn render_row(row: &Row, interpret: bool) -> Vec<String> {
        let mut cells: Vec<String> = row
            .iter()
            .map(|(_, cell)| cell.unwrap_or("").to_string())
            .collect();
        if interpret {
            let band = OmegaBand::of_cell(row.get("Omega"));
            cells.push(band.map_or("N/A", |b| b.as_str()).to_string());
        }
        cells
    }
}

impl<W: Write + Send> Sink for TextSink<W> {
    fn present(&self, name: &str, dataset: &Dataset) {
        let text = Self::render(name, dataset);
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(out, "{text}") {
            tracing::warn!(dataset = name, error = %err, "text sink write failed");
        }
    }
}
