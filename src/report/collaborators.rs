//! Presentation and export seams for finished reports.
//!
//! Rendering charts or writing spreadsheets is left to callers; the crate
//! only defines the traits and ships a plain CSV exporter.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DiagnosticsReport;
use crate::error::Result;

/// Displays a report (plots, terminal tables, ...).
pub trait Presenter {
    fn present(&mut self, report: &DiagnosticsReport) -> Result<()>;
}

/// Persists the three report tables.
pub trait TableExporter {
    fn export(&mut self, report: &DiagnosticsReport) -> Result<()>;
}

/// Optional collaborators used by [`super::run`].
#[derive(Default)]
pub struct Collaborators {
    pub presenter: Option<Box<dyn Presenter>>,
    pub exporter: Option<Box<dyn TableExporter>>,
}

impl Collaborators {
    /// No presenter and no exporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the presenter.
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Set the exporter.
    pub fn with_exporter(mut self, exporter: impl TableExporter + 'static) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }
}

/// Writes `lags.csv`, `stationarity.csv` and `normality.csv` into a directory.
///
/// Undefined cells are written as empty fields.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub const LAGS_FILE: &'static str = "lags.csv";
    pub const STATIONARITY_FILE: &'static str = "stationarity.csv";
    pub const NORMALITY_FILE: &'static str = "normality.csv";

    /// Export into `dir`, created on first export if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_table(&self, name: &str, header: &str, lines: &[String]) -> Result<()> {
        let path = self.dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", header)?;
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = lines.len(), "table exported");
        Ok(())
    }
}

impl TableExporter for CsvExporter {
    fn export(&mut self, report: &DiagnosticsReport) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let lags: Vec<String> = report
            .lags
            .iter()
            .map(|row| {
                format!(
                    "{},{},{},{},{},{},{}",
                    row.lag,
                    row.acf,
                    row.pacf,
                    row.box_pierce,
                    row.box_pierce_p_value,
                    row.ljung_box,
                    row.ljung_box_p_value
                )
            })
            .collect();
        self.write_table(
            Self::LAGS_FILE,
            "lag,acf,pacf,box_pierce,box_pierce_p_value,ljung_box,ljung_box_p_value",
            &lags,
        )?;

        let stationarity: Vec<String> = report
            .stationarity
            .iter()
            .map(|row| {
                format!(
                    "{},{},{}",
                    row.test.name(),
                    cell(row.statistic),
                    cell(row.p_value)
                )
            })
            .collect();
        self.write_table(Self::STATIONARITY_FILE, "test,statistic,p_value", &stationarity)?;

        let normality: Vec<String> = report
            .normality
            .rows()
            .iter()
            .map(|row| {
                format!(
                    "{},{},{}",
                    row.test.name(),
                    cell(row.statistic),
                    cell(row.p_value)
                )
            })
            .collect();
        self.write_table(Self::NORMALITY_FILE, "test,statistic,p_value", &normality)
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_formats_undefined_as_empty() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(0.5)), "0.5");
    }

    #[test]
    fn collaborators_default_is_empty() {
        let collaborators = Collaborators::new();
        assert!(collaborators.presenter.is_none());
        assert!(collaborators.exporter.is_none());
    }

    #[test]
    fn csv_exporter_keeps_directory() {
        let exporter = CsvExporter::new("/tmp/reports");
        assert_eq!(exporter.dir(), Path::new("/tmp/reports"));
    }
}
