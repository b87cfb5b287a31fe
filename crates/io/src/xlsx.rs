// Excel import (xlsx, xls, xlsb, ods) and report export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Table, TableColumn, TableStyle, Workbook, XlsxError};

use rackrecon::model::{Dataset, Record, Value};

use crate::error::{LoadError, ReportError};
use crate::report::{ReportKind, ReportTable};
use crate::LoadOptions;

/// Font size used for every report cell.
const REPORT_FONT_SIZE: f64 = 16.0;
const DIFFERENCES_MAX_WIDTH: usize = 35;
const EXISTENCE_WIDTH: f64 = 50.0;

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Load one worksheet. The first non-empty row is the header.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| LoadError::read(path, format!("failed to open workbook: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match &options.sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| *n == wanted)
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.clone(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::NoSheets(path.to_path_buf()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::read(path, format!("failed to read sheet '{sheet_name}': {e}")))?;

    // Range may not start at A1; keep sheet row numbers 1-based
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

    let mut rows = range.rows().enumerate();
    let (_, header) = rows
        .by_ref()
        .find(|(_, row)| row.iter().any(|c| !is_blank(c)))
        .ok_or_else(|| LoadError::NoHeader(path.to_path_buf()))?;

    let mut columns: Vec<(usize, String)> = Vec::new();
    for (idx, cell) in header.iter().enumerate() {
        let name = cell_value(cell, true).render();
        let name = name.trim();
        if name.is_empty() || columns.iter().any(|(_, c)| c == name) {
            continue;
        }
        columns.push((idx, name.to_string()));
    }

    let mut dataset = Dataset::new(options.label.clone(), columns.iter().map(|(_, c)| c));
    for (offset, row) in rows {
        if row.iter().all(is_blank) {
            continue;
        }
        let mut record = Record::new(first_row + offset + 1);
        for (idx, name) in &columns {
            let value = row
                .get(*idx)
                .map(|c| cell_value(c, options.is_text_column(name)))
                .unwrap_or(Value::Null);
            if !value.is_null() {
                record.set(name.clone(), value);
            }
        }
        dataset.rows.push(record);
    }

    log::debug!(
        "{}: read sheet '{}' ({} data rows)",
        path.display(),
        sheet_name,
        dataset.len()
    );
    Ok(dataset)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Map a calamine cell to a `Value`. Text columns render every value as text.
fn cell_value(cell: &Data, as_text: bool) -> Value {
    let value = match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::Text(e.to_string()),
        Data::DateTime(dt) => Value::Text(excel_serial_to_iso(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    };
    match value {
        Value::Number(_) | Value::Bool(_) if as_text => Value::Text(value.render()),
        other => other,
    }
}

/// Render an Excel serial date (1900 system) as ISO-8601.
fn excel_serial_to_iso(serial: f64) -> String {
    // 2958465 is 9999-12-31
    if !(0.0..2_958_466.0).contains(&serial) {
        return Value::Number(serial).render();
    }
    let epoch = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    let millis = (serial * 86_400_000.0).round() as i64;
    match epoch.and_then(|e| e.checked_add_signed(chrono::Duration::milliseconds(millis))) {
        Some(dt) if serial.fract() == 0.0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => Value::Number(serial).render(),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write a report as a single-sheet workbook holding one Excel table.
pub fn export(table: &ReportTable, path: &Path) -> Result<(), ReportError> {
    export_table(table, path).map_err(|e| ReportError::new(path, e))
}

fn export_table(table: &ReportTable, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let format = Format::new().set_font_size(REPORT_FONT_SIZE);

    for (r, row) in table.rows.iter().enumerate() {
        let xr = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let xc = c as u16;
            match value {
                Value::Null => worksheet.write_blank(xr, xc, &format)?,
                Value::Text(s) => worksheet.write_string_with_format(xr, xc, s, &format)?,
                Value::Number(n) => worksheet.write_number_with_format(xr, xc, *n, &format)?,
                Value::Bool(b) => worksheet.write_boolean_with_format(xr, xc, *b, &format)?,
            };
        }
    }

    // An Excel table needs at least one data row
    let last_row = table.rows.len().max(1) as u32;
    if table.rows.is_empty() {
        for c in 0..table.headers.len() {
            worksheet.write_blank(1, c as u16, &format)?;
        }
    }

    let columns: Vec<TableColumn> = table
        .headers
        .iter()
        .map(|h| TableColumn::new().set_header(h).set_header_format(&format))
        .collect();
    let excel_table = Table::new().set_style(TableStyle::Medium9).set_columns(&columns);
    let last_col = table.headers.len().saturating_sub(1) as u16;
    worksheet.add_table(0, 0, last_row, last_col, &excel_table)?;

    for (c, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(c as u16, width)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Field reports size columns to content, capped; existence reports use a
/// fixed width.
fn column_widths(table: &ReportTable) -> Vec<f64> {
    match table.kind {
        ReportKind::Existence => vec![EXISTENCE_WIDTH; table.headers.len()],
        ReportKind::Differences => (0..table.headers.len())
            .map(|c| {
                let longest = table
                    .rows
                    .iter()
                    .filter_map(|row| row.get(c))
                    .map(|v| v.render().chars().count())
                    .chain(std::iter::once(table.headers[c].chars().count()))
                    .max()
                    .unwrap_or(0);
                ((longest + 2) * 2).min(DIFFERENCES_MAX_WIDTH) as f64
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options() -> LoadOptions {
        LoadOptions {
            label: "sm.xlsx".into(),
            sheet: None,
            text_columns: vec!["Node".into()],
        }
    }

    /// Build a small inventory workbook with a leading blank row.
    fn write_inventory(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Export").unwrap();
        sheet.write_string(1, 0, "Physical UHN ").unwrap();
        sheet.write_string(1, 1, "Node").unwrap();
        sheet.write_string(1, 2, "Slots").unwrap();
        sheet.write_string(1, 3, "Status").unwrap();
        sheet.write_string(2, 0, "U1").unwrap();
        sheet.write_number(2, 1, 5.0).unwrap();
        sheet.write_number(2, 2, 42.0).unwrap();
        sheet.write_string(2, 3, "-").unwrap();
        sheet.write_string(3, 0, "U2").unwrap();
        sheet.write_boolean(3, 3, true).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_load_first_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sm.xlsx");
        write_inventory(&path);

        let ds = load(&path, &options()).unwrap();
        assert_eq!(ds.columns, vec!["Physical UHN", "Node", "Slots", "Status"]);
        assert_eq!(ds.len(), 2);
        // Header on sheet row 2, first data row is 3
        assert_eq!(ds.rows[0].row, 3);
        assert_eq!(ds.rows[0].get("Node"), &Value::text("5"));
        assert_eq!(ds.rows[0].get("Slots"), &Value::Number(42.0));
        assert_eq!(ds.rows[0].get("Status"), &Value::text("-"));
        assert_eq!(ds.rows[1].get("Node"), &Value::Null);
        assert_eq!(ds.rows[1].get("Status"), &Value::Bool(true));
    }

    #[test]
    fn test_named_sheet_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sm.xlsx");
        write_inventory(&path);

        let opts = LoadOptions { sheet: Some("Raw".into()), ..options() };
        match load(&path, &opts) {
            Err(LoadError::SheetNotFound { sheet, available, .. }) => {
                assert_eq!(sheet, "Raw");
                assert_eq!(available, vec!["Export".to_string()]);
            }
            other => panic!("expected SheetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_serial_dates_render_iso() {
        assert_eq!(excel_serial_to_iso(45292.0), "2024-01-01");
        assert_eq!(excel_serial_to_iso(45292.5), "2024-01-01T12:00:00");
        assert_eq!(excel_serial_to_iso(-1.0), "-1");
    }

    #[test]
    fn test_export_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("differences.xlsx");
        let table = ReportTable {
            kind: ReportKind::Differences,
            headers: ["Physical UHN", "Affected Column(s)", "SM DATA", "SF DATA"]
                .map(String::from)
                .to_vec(),
            rows: vec![vec![
                Value::text("U1"),
                Value::text("Node"),
                Value::Number(7.0),
                Value::text("Column not in File2"),
            ]],
        };
        export(&table, &path).unwrap();

        let mut workbook: Sheets<_> = open_workbook_auto(&path).unwrap();
        let name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&name).unwrap();
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("Affected Column(s)".into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(7.0)));
        assert_eq!(range.get_value((1, 3)), Some(&Data::String("Column not in File2".into())));
    }

    #[test]
    fn test_export_empty_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uhn_differences.xlsx");
        let table = ReportTable {
            kind: ReportKind::Existence,
            headers: vec!["Physical UHN".into(), "Differences found in file:".into()],
            rows: Vec::new(),
        };
        export(&table, &path).unwrap();

        let mut workbook: Sheets<_> = open_workbook_auto(&path).unwrap();
        let name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&name).unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Physical UHN".into())));
    }

    #[test]
    fn test_column_widths() {
        let table = ReportTable {
            kind: ReportKind::Differences,
            headers: vec!["Physical UHN".into(), "Status".into()],
            rows: vec![vec![Value::text("U1"), Value::text("a much longer status value here")]],
        };
        // "Physical UHN" is 12 chars: (12 + 2) * 2 = 28; second column capped
        assert_eq!(column_widths(&table), vec![28.0, 35.0]);

        let existence = ReportTable { kind: ReportKind::Existence, ..table };
        assert_eq!(column_widths(&existence), vec![50.0, 50.0]);
    }
}
