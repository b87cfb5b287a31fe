//! Key-only full outer join over raw identity values.
//!
//! Independent of [`crate::align`]: no pad normalization, no dedup, no key
//! trimming. Only the site filter on source A is shared.

use std::collections::HashSet;
use std::fmt;

use crate::align::filter_site;
use crate::error::ReconError;
use crate::model::{Dataset, ExistenceDifference, Record, Side};

/// Identity value exactly as loaded, rendered to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawKey(String);

impl RawKey {
    fn of(record: &Record, identity: &str) -> Option<Self> {
        let s = record.get(identity).render();
        if s.is_empty() {
            None
        } else {
            Some(RawKey(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ExistenceOptions {
    pub identity: String,
    pub site: String,
    pub label_a: String,
    pub label_b: String,
}

impl ExistenceOptions {
    pub fn from_config(config: &crate::config::ReconConfig) -> Self {
        Self {
            identity: config.keys.identity.clone(),
            site: config.keys.site.clone(),
            label_a: config.label_a().to_string(),
            label_b: config.label_b().to_string(),
        }
    }
}

impl Default for ExistenceOptions {
    fn default() -> Self {
        Self::from_config(&crate::config::ReconConfig::default())
    }
}

/// Report keys present in exactly one of (site-filtered A, B).
///
/// A-only keys come first in A's row order, then B-only keys in B's row
/// order. Repeated raw keys are reported once.
pub fn compare_existence(
    a: &Dataset,
    b: &Dataset,
    site: &str,
    options: &ExistenceOptions,
) -> Result<Vec<ExistenceDifference>, ReconError> {
    if !b.has_column(&options.identity) {
        return Err(ReconError::schema(&b.label, &options.identity));
    }
    let a_rows = filter_site(a, &options.identity, &options.site, site)?;

    let a_keys = ordered_keys(a_rows.into_iter(), &options.identity);
    let b_keys = ordered_keys(b.rows.iter(), &options.identity);
    let a_set: HashSet<&RawKey> = a_keys.iter().collect();
    let b_set: HashSet<&RawKey> = b_keys.iter().collect();

    let mut out = Vec::new();
    for key in a_keys.iter().filter(|k| !b_set.contains(k)) {
        out.push(ExistenceDifference {
            key: key.to_string(),
            only_in: Side::A,
            source: options.label_a.clone(),
        });
    }
    for key in b_keys.iter().filter(|k| !a_set.contains(k)) {
        out.push(ExistenceDifference {
            key: key.to_string(),
            only_in: Side::B,
            source: options.label_b.clone(),
        });
    }

    log::debug!(
        "existence pass: {} raw keys in {}, {} in {}, {} one-sided",
        a_keys.len(),
        a.label,
        b_keys.len(),
        b.label,
        out.len()
    );
    Ok(out)
}

/// Distinct non-blank raw keys in first-seen order.
fn ordered_keys<'a>(rows: impl Iterator<Item = &'a Record>, identity: &str) -> Vec<RawKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for row in rows {
        if let Some(key) = RawKey::of(row, identity) {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn source_a(rows: &[(&str, &str)]) -> Dataset {
        let mut ds = Dataset::new("sm.xlsx", ["Physical UHN", "Site ID"]);
        for (k, s) in rows {
            ds.push_row([("Physical UHN", *k), ("Site ID", *s)]);
        }
        ds
    }

    fn source_b(keys: &[&str]) -> Dataset {
        let mut ds = Dataset::new("sf.xlsx", ["Physical UHN"]);
        for k in keys {
            ds.push_row([("Physical UHN", *k)]);
        }
        ds
    }

    fn options() -> ExistenceOptions {
        ExistenceOptions {
            label_a: "sm.xlsx".into(),
            label_b: "sf.xlsx".into(),
            ..ExistenceOptions::default()
        }
    }

    #[test]
    fn reports_symmetric_difference() {
        let a = source_a(&[("X1", "S1"), ("X2", "S1")]);
        let b = source_b(&["X2", "X3"]);
        let out = compare_existence(&a, &b, "S1", &options()).unwrap();
        assert_eq!(
            out,
            vec![
                ExistenceDifference {
                    key: "X1".into(),
                    only_in: Side::A,
                    source: "sm.xlsx".into()
                },
                ExistenceDifference {
                    key: "X3".into(),
                    only_in: Side::B,
                    source: "sf.xlsx".into()
                },
            ]
        );
    }

    #[test]
    fn site_filter_applies_to_a_only() {
        let a = source_a(&[("X1", "S1"), ("X2", "S2")]);
        let b = source_b(&["X1", "X2"]);
        let out = compare_existence(&a, &b, " S1 ", &options()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "X2");
        assert_eq!(out[0].only_in, Side::B);
    }

    #[test]
    fn raw_keys_are_not_trimmed() {
        let a = source_a(&[("X1 ", "S1")]);
        let b = source_b(&["X1"]);
        let out = compare_existence(&a, &b, "S1", &options()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key, "X1 ");
        assert_eq!(out[1].key, "X1");
    }

    #[test]
    fn duplicates_reported_once() {
        let a = source_a(&[("X1", "S1"), ("X1", "S1")]);
        let b = source_b(&["X9", "X9"]);
        let out = compare_existence(&a, &b, "S1", &options()).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn numeric_and_text_keys_join_by_rendering() {
        let mut a = Dataset::new("sm.xlsx", ["Physical UHN", "Site ID"]);
        a.push_row([("Physical UHN", Value::Number(1001.0)), ("Site ID", Value::text("S1"))]);
        let b = source_b(&["1001"]);
        let out = compare_existence(&a, &b, "S1", &options()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let a = Dataset::new("sm.xlsx", ["Physical UHN"]);
        let b = source_b(&[]);
        let err = compare_existence(&a, &b, "S1", &options()).unwrap_err();
        assert_eq!(err, ReconError::schema("sm.xlsx", "Site ID"));

        let a = source_a(&[]);
        let b = Dataset::new("sf.xlsx", ["UHN"]);
        let err = compare_existence(&a, &b, "S1", &options()).unwrap_err();
        assert_eq!(err, ReconError::schema("sf.xlsx", "Physical UHN"));
    }
}
