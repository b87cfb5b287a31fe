//! File I/O for rackrecon: loading datasets from spreadsheets and CSV,
//! writing difference reports.

pub mod csv;
pub mod error;
pub mod json;
pub mod report;
pub mod xlsx;

use std::path::Path;

use rackrecon::model::{Dataset, Side};
use rackrecon::ReconConfig;

pub use error::{LoadError, ReportError};
pub use report::{write_reports, ReportFormat, ReportPaths};

/// How to read one source file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Dataset label carried into reports and error messages.
    pub label: String,
    /// Worksheet to read; the first sheet when unset. Ignored for CSV.
    pub sheet: Option<String>,
    /// Columns kept as text even when cells are numeric.
    pub text_columns: Vec<String>,
}

impl LoadOptions {
    /// Options for one side of a run. The identity, site and pad columns
    /// are read as text so leading zeros survive.
    pub fn for_side(config: &ReconConfig, side: Side) -> Self {
        let (label, source) = match side {
            Side::A => (config.label_a(), &config.sources.a),
            Side::B => (config.label_b(), &config.sources.b),
        };

        let mut text_columns: Vec<String> = Vec::new();
        let keys = [config.keys.identity.as_str(), config.keys.site.as_str()];
        let pads = config.normalize.pad.iter().map(|p| p.column.as_str());
        for column in keys.into_iter().chain(pads) {
            let column = column.trim();
            if !text_columns.iter().any(|c| c == column) {
                text_columns.push(column.to_string());
            }
        }

        LoadOptions {
            label: label.to_string(),
            sheet: source.sheet.clone(),
            text_columns,
        }
    }

    pub(crate) fn is_text_column(&self, column: &str) -> bool {
        self.text_columns.iter().any(|c| c == column)
    }
}

/// Load a dataset, picking the reader from the file extension.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let dataset = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::load(path, options)?,
        "csv" | "txt" => csv::load(path, options)?,
        "tsv" => csv::load_with_delimiter(path, options, b'\t')?,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            })
        }
    };

    log::debug!(
        "loaded {} ({} columns, {} rows) from {}",
        dataset.label,
        dataset.columns.len(),
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}
