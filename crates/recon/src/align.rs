//! Record alignment: site filter, pad normalization, keep-first dedup, and
//! the unified key set.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

use crate::config::{PadField, ReconConfig};
use crate::error::ReconError;
use crate::model::{AlignStats, Dataset, Record};
use crate::normalize::{identity_text, pad_integer, site_text};

/// Trimmed identity key used to pair records for field comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AlignOptions {
    pub identity: String,
    pub site: String,
    pub pad: Vec<PadField>,
}

impl AlignOptions {
    pub fn from_config(config: &ReconConfig) -> Self {
        Self {
            identity: config.keys.identity.clone(),
            site: config.keys.site.clone(),
            pad: config.normalize.pad.clone(),
        }
    }
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self::from_config(&ReconConfig::default())
    }
}

/// One deduplicated, normalized side of an alignment.
#[derive(Debug, Clone)]
pub struct AlignedSide {
    pub label: String,
    pub columns: Vec<String>,
    records: Vec<Record>,
    index: HashMap<IdentityKey, usize>,
}

impl AlignedSide {
    pub fn get(&self, key: &IdentityKey) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Records in source row order, first occurrence per key only.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Output of [`align`]. Only constructible through it, so the identity
/// column is known to exist on both sides.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub a: AlignedSide,
    pub b: AlignedSide,
    pub keys: BTreeSet<IdentityKey>,
    pub stats: AlignStats,
}

impl Alignment {
    pub fn keys_in_both(&self) -> usize {
        self.keys
            .iter()
            .filter(|k| self.a.contains(k) && self.b.contains(k))
            .count()
    }
}

/// Rows of `a` whose trimmed site value equals the trimmed `site`.
/// Errors when either required column is missing.
pub(crate) fn filter_site<'a>(
    a: &'a Dataset,
    identity: &str,
    site_column: &str,
    site: &str,
) -> Result<Vec<&'a Record>, ReconError> {
    if !a.has_column(identity) {
        return Err(ReconError::schema(&a.label, identity));
    }
    if !a.has_column(site_column) {
        return Err(ReconError::schema(&a.label, site_column));
    }
    let wanted = site.trim();
    Ok(a.rows
        .iter()
        .filter(|r| site_text(r.get(site_column)) == wanted)
        .collect())
}

/// Align source A (filtered to `site`) with source B.
pub fn align(
    a: &Dataset,
    b: &Dataset,
    site: &str,
    options: &AlignOptions,
) -> Result<Alignment, ReconError> {
    if !b.has_column(&options.identity) {
        return Err(ReconError::schema(&b.label, &options.identity));
    }
    let a_rows = filter_site(a, &options.identity, &options.site, site)?;

    let mut stats = AlignStats {
        a_rows: a.len(),
        a_rows_in_site: a_rows.len(),
        b_rows: b.len(),
        ..AlignStats::default()
    };

    let (a_side, a_dups, a_blank) = build_side(a, a_rows, options)?;
    let (b_side, b_dups, b_blank) = build_side(b, b.rows.iter().collect(), options)?;
    stats.a_duplicates_dropped = a_dups;
    stats.a_blank_keys = a_blank;
    stats.b_duplicates_dropped = b_dups;
    stats.b_blank_keys = b_blank;

    let keys: BTreeSet<IdentityKey> = a_side
        .index
        .keys()
        .chain(b_side.index.keys())
        .cloned()
        .collect();

    log::debug!(
        "aligned {} ({} of {} rows in site '{}') with {} ({} rows): {} unified keys",
        a.label,
        stats.a_rows_in_site,
        stats.a_rows,
        site.trim(),
        b.label,
        stats.b_rows,
        keys.len()
    );

    Ok(Alignment {
        a: a_side,
        b: b_side,
        keys,
        stats,
    })
}

/// Normalize, dedup and index one side. Returns (side, duplicates, blanks).
fn build_side(
    dataset: &Dataset,
    rows: Vec<&Record>,
    options: &AlignOptions,
) -> Result<(AlignedSide, usize, usize), ReconError> {
    let pads: Vec<&PadField> = options
        .pad
        .iter()
        .filter(|p| {
            let present = dataset.has_column(&p.column);
            if !present {
                log::debug!("{}: pad column '{}' not present, skipping", dataset.label, p.column);
            }
            present
        })
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    let mut index = HashMap::with_capacity(rows.len());
    let mut duplicates = 0;
    let mut blanks = 0;

    for row in rows {
        // Pad runs before dedup: a bad value in a dropped duplicate still fails
        let record = pad_record(dataset, row, &pads)?;

        let Some(key) = identity_text(record.get(&options.identity)) else {
            log::warn!(
                "{}, row {}: blank '{}', row skipped",
                dataset.label,
                row.row,
                options.identity
            );
            blanks += 1;
            continue;
        };
        let key = IdentityKey(key);
        if index.contains_key(&key) {
            log::debug!("{}, row {}: duplicate key '{}' dropped", dataset.label, row.row, key);
            duplicates += 1;
            continue;
        }
        index.insert(key, records.len());
        records.push(record);
    }

    Ok((
        AlignedSide {
            label: dataset.label.clone(),
            columns: dataset.columns.clone(),
            records,
            index,
        },
        duplicates,
        blanks,
    ))
}

fn pad_record(dataset: &Dataset, row: &Record, pads: &[&PadField]) -> Result<Record, ReconError> {
    let mut record = row.clone();
    for pad in pads {
        let padded = pad_integer(row.get(&pad.column), pad.width).map_err(|e| {
            ReconError::DataFormat {
                dataset: dataset.label.clone(),
                field: pad.column.clone(),
                row: row.row,
                value: e.0,
            }
        })?;
        record.fields.insert(pad.column.clone(), padded);
    }
    Ok(record)
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        IdentityKey(s.trim().to_string())
    }
}

impl PartialEq<str> for IdentityKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for IdentityKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
