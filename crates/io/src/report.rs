//! Report tables for the two reconciliation outputs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rackrecon::model::{Observed, ReconResult, Side, Value};
use rackrecon::ReconConfig;

use crate::error::ReportError;

pub use rackrecon::config::AFFECTED_COLUMN_HEADER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Differences,
    Existence,
}

/// Header row plus typed data rows, independent of the output format.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ReportTable {
    /// Field-difference report: key, field, A value, B value.
    pub fn differences(result: &ReconResult, config: &ReconConfig) -> Self {
        let headers = vec![
            config.keys.identity.clone(),
            AFFECTED_COLUMN_HEADER.to_string(),
            config.output.value_a_header.clone(),
            config.output.value_b_header.clone(),
        ];
        let rows = result
            .differences
            .iter()
            .map(|d| {
                vec![
                    Value::text(&d.key),
                    Value::text(&d.field),
                    observed_cell(&d.a, Side::A),
                    observed_cell(&d.b, Side::B),
                ]
            })
            .collect();
        ReportTable { kind: ReportKind::Differences, headers, rows }
    }

    /// Existence report: key and the label of the only file holding it.
    pub fn existence(result: &ReconResult, config: &ReconConfig) -> Self {
        let headers = vec![
            config.keys.identity.clone(),
            config.output.existence_header.clone(),
        ];
        let rows = result
            .existence
            .iter()
            .map(|e| vec![Value::text(&e.key), Value::text(&e.source)])
            .collect();
        ReportTable { kind: ReportKind::Existence, headers, rows }
    }
}

fn observed_cell(observed: &Observed, side: Side) -> Value {
    match observed {
        Observed::Value(v) => v.clone(),
        Observed::ColumnAbsent => Value::text(side.missing_column_marker()),
    }
}

// ---------------------------------------------------------------------------
// Output format + paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ReportFormat::Xlsx),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format '{other}' (expected xlsx or csv)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub differences: PathBuf,
    pub existence: PathBuf,
}

impl ReportPaths {
    /// Paths from the config, with the extension matched to `format`.
    pub fn from_config(config: &ReconConfig, format: ReportFormat) -> Self {
        ReportPaths {
            differences: with_format(Path::new(&config.output.differences), format),
            existence: with_format(Path::new(&config.output.existence), format),
        }
    }
}

fn with_format(path: &Path, format: ReportFormat) -> PathBuf {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()));
    if matches {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn write_table(
    table: &ReportTable,
    path: &Path,
    format: ReportFormat,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Xlsx => crate::xlsx::export(table, path),
        ReportFormat::Csv => crate::csv::export(table, path),
    }
}

/// Write both reports. Each is written even when it has no rows.
pub fn write_reports(
    result: &ReconResult,
    config: &ReconConfig,
    paths: &ReportPaths,
    format: ReportFormat,
) -> Result<(), ReportError> {
    let differences = ReportTable::differences(result, config);
    write_table(&differences, &paths.differences, format)?;
    log::info!(
        "wrote {} field differences to {}",
        differences.rows.len(),
        paths.differences.display()
    );

    let existence = ReportTable::existence(result, config);
    write_table(&existence, &paths.existence, format)?;
    log::info!(
        "wrote {} existence differences to {}",
        existence.rows.len(),
        paths.existence.display()
    );
    Ok(())
}
