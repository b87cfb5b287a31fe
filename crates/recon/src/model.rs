use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single scalar cell value. Equality is type-aware: `Text("5")` never
/// equals `Number(5.0)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render for keys and reports. Integral numbers drop the trailing `.0`.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => render_number(*n),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

pub(crate) fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of a dataset, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// 1-based row number in the source sheet (header is row 1).
    pub row: usize,
    pub fields: HashMap<String, Value>,
}

impl Record {
    pub fn new(row: usize) -> Self {
        Self { row, fields: HashMap::new() }
    }

    /// Value for `column`, `Null` when the row has nothing there.
    pub fn get(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }
}

/// A loaded table: ordered column names plus rows in source order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Dataset {
    /// Column names are trimmed; duplicates after trimming keep the first.
    pub fn new<I, S>(label: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cols: Vec<String> = Vec::new();
        for c in columns {
            let c = c.as_ref().trim();
            if !c.is_empty() && !cols.iter().any(|x| x == c) {
                cols.push(c.to_string());
            }
        }
        Self {
            label: label.into(),
            columns: cols,
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a row given as (column, value) pairs. Row numbers continue
    /// from the last row, starting at 2.
    pub fn push_row<I, S, V>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let row = self.rows.last().map(|r| r.row + 1).unwrap_or(2);
        let mut record = Record::new(row);
        for (k, v) in cells {
            record.set(k, v);
        }
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Field differences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }

    /// Report literal for a comparison column missing from this side.
    pub fn missing_column_marker(&self) -> &'static str {
        match self {
            Side::A => "Column not in File1",
            Side::B => "Column not in File2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a field difference.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Value(Value),
    ColumnAbsent,
}

impl Observed {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Observed::Value(v) => Some(v),
            Observed::ColumnAbsent => None,
        }
    }

    /// Report rendering; `side` picks the missing-column marker.
    pub fn render(&self, side: Side) -> String {
        match self {
            Observed::Value(v) => v.render(),
            Observed::ColumnAbsent => side.missing_column_marker().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDifference {
    pub key: String,
    pub field: String,
    pub a: Observed,
    pub b: Observed,
}

impl Serialize for FieldDifference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        fn observed(o: &Observed, side: Side) -> Value {
            match o {
                Observed::Value(v) => v.clone(),
                Observed::ColumnAbsent => Value::text(side.missing_column_marker()),
            }
        }

        let mut s = serializer.serialize_struct("FieldDifference", 4)?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("field", &self.field)?;
        s.serialize_field("a", &observed(&self.a, Side::A))?;
        s.serialize_field("b", &observed(&self.b, Side::B))?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Existence differences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistenceDifference {
    pub key: String,
    pub only_in: Side,
    /// Label of the side that holds the key.
    pub source: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignStats {
    pub a_rows: usize,
    pub a_rows_in_site: usize,
    pub b_rows: usize,
    pub a_duplicates_dropped: usize,
    pub b_duplicates_dropped: usize,
    pub a_blank_keys: usize,
    pub b_blank_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    #[serde(flatten)]
    pub alignment: AlignStats,
    pub unified_keys: usize,
    pub keys_in_both: usize,
    pub field_differences: usize,
    pub differences_by_field: BTreeMap<String, usize>,
    pub only_in_a: usize,
    pub only_in_b: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub site: String,
    pub identity_column: String,
    pub source_a: String,
    pub source_b: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub differences: Vec<FieldDifference>,
    pub existence: Vec<ExistenceDifference>,
}

impl ReconResult {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty() || !self.existence.is_empty()
    }
}
