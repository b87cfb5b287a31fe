use crate::align::Alignment;
use crate::model::{FieldDifference, Observed, Value};
use crate::normalize::strip_sentinel;

/// Walk the unified keys present on both sides and report every field
/// whose values disagree.
///
/// Keys held by only one side are skipped here; the existence pass
/// reports them. A comparison column missing from a side always yields a
/// difference carrying [`Observed::ColumnAbsent`] for that side.
pub fn compare_fields(
    alignment: &Alignment,
    fields: &[String],
    sentinel: &str,
) -> Vec<FieldDifference> {
    let mut diffs = Vec::new();

    for key in &alignment.keys {
        let (Some(a_rec), Some(b_rec)) = (alignment.a.get(key), alignment.b.get(key)) else {
            continue;
        };

        for field in fields {
            let in_a = alignment.a.has_column(field);
            let in_b = alignment.b.has_column(field);

            if in_a && in_b {
                let a_val = strip_sentinel(a_rec.get(field), sentinel);
                let b_val = b_rec.get(field);
                if a_val.is_null() && b_val.is_null() {
                    continue;
                }
                if &a_val != b_val {
                    diffs.push(FieldDifference {
                        key: key.to_string(),
                        field: field.clone(),
                        a: Observed::Value(a_val),
                        b: Observed::Value(b_val.clone()),
                    });
                }
            } else {
                diffs.push(FieldDifference {
                    key: key.to_string(),
                    field: field.clone(),
                    a: observe(in_a, a_rec.get(field)),
                    b: observe(in_b, b_rec.get(field)),
                });
            }
        }
    }

    log::debug!(
        "compared {} fields across {} keys: {} differences",
        fields.len(),
        alignment.keys_in_both(),
        diffs.len()
    );
    diffs
}

fn observe(present: bool, value: &Value) -> Observed {
    if present {
        Observed::Value(value.clone())
    } else {
        Observed::ColumnAbsent
    }
}
