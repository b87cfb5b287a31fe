// CSV/TSV loading and report export

use std::io::Read;
use std::path::Path;

use rackrecon::model::{Dataset, Record, Value};

use crate::error::{LoadError, ReportError};
use crate::report::ReportTable;
use crate::LoadOptions;

/// Load a CSV file, sniffing the delimiter.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    load_from_string(path, &content, delimiter, options)
}

pub fn load_with_delimiter(
    path: &Path,
    options: &LoadOptions,
    delimiter: u8,
) -> Result<Dataset, LoadError> {
    let content = read_file_as_utf8(path)?;
    load_from_string(path, &content, delimiter, options)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> =
        content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = match counts.first() {
            Some(&n) if n > 1 => n,
            _ => continue,
        };
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path).map_err(|e| LoadError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| LoadError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are usually Windows-1252
            log::debug!("{}: not valid UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn load_from_string(
    path: &Path,
    content: &str,
    delimiter: u8,
    options: &LoadOptions,
) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = loop {
        match records.next() {
            Some(result) => {
                let record = result.map_err(|e| LoadError::read(path, e))?;
                if record.iter().any(|f| !f.trim().is_empty()) {
                    break record;
                }
            }
            None => return Err(LoadError::NoHeader(path.to_path_buf())),
        }
    };

    // (field index, column name); blank and repeated headers are dropped
    let mut columns: Vec<(usize, String)> = Vec::new();
    for (idx, name) in header.iter().enumerate() {
        let name = name.trim();
        if name.is_empty() || columns.iter().any(|(_, c)| c == name) {
            continue;
        }
        columns.push((idx, name.to_string()));
    }

    let mut raw_rows: Vec<(usize, Vec<Option<String>>)> = Vec::new();
    for (offset, result) in records.enumerate() {
        let record = result.map_err(|e| LoadError::read(path, e))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(offset + 2);
        let cells = columns
            .iter()
            .map(|(idx, _)| record.get(*idx).filter(|f| !f.is_empty()).map(str::to_string))
            .collect();
        raw_rows.push((line, cells));
    }

    // A column is numeric when every non-empty cell parses as a number
    let numeric: Vec<bool> = columns
        .iter()
        .enumerate()
        .map(|(i, (_, name))| {
            !options.is_text_column(name)
                && raw_rows.iter().any(|(_, cells)| cells[i].is_some())
                && raw_rows.iter().all(|(_, cells)| {
                    cells[i].as_deref().map_or(true, |c| parse_number(c).is_some())
                })
        })
        .collect();

    let mut dataset = Dataset::new(options.label.clone(), columns.iter().map(|(_, c)| c));
    for (line, cells) in raw_rows {
        let mut record = Record::new(line);
        for (i, cell) in cells.into_iter().enumerate() {
            let Some(text) = cell else { continue };
            let value = if numeric[i] {
                parse_number(&text).map(Value::Number).unwrap_or(Value::Text(text))
            } else {
                Value::Text(text)
            };
            record.set(columns[i].1.clone(), value);
        }
        dataset.rows.push(record);
    }

    Ok(dataset)
}

/// Strict numeric parse: digits with optional sign, decimal point and exponent.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let first = s.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn export(table: &ReportTable, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| ReportError::new(path, e))?;

    writer
        .write_record(&table.headers)
        .map_err(|e| ReportError::new(path, e))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|v| v.render()))
            .map_err(|e| ReportError::new(path, e))?;
    }

    writer.flush().map_err(|e| ReportError::new(path, e))?;
    Ok(())
}
