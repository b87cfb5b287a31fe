//! Value normalization rules shared by the aligner and the comparator.

use crate::model::Value;

/// Why a value could not be padded. The caller attaches dataset/row context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAnInteger(pub String);

/// Re-render a value as a zero-padded integer of `width` digits.
///
/// Null and blank text pad to all zeros. Numbers must be integral; text
/// must parse as a signed integer after trimming.
pub fn pad_integer(value: &Value, width: usize) -> Result<Value, NotAnInteger> {
    let n: i64 = match value {
        Value::Null => 0,
        Value::Number(n) => {
            if n.fract() != 0.0 || !n.is_finite() || n.abs() >= 1e15 {
                return Err(NotAnInteger(value.render()));
            }
            *n as i64
        }
        Value::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                0
            } else {
                t.parse::<i64>().map_err(|_| NotAnInteger(s.clone()))?
            }
        }
        Value::Bool(_) => return Err(NotAnInteger(value.render())),
    };
    Ok(Value::Text(format!("{n:0width$}")))
}

/// Source-A sentinel handling: the sentinel string compares as Null.
pub fn strip_sentinel(value: &Value, sentinel: &str) -> Value {
    match value {
        Value::Text(s) if s == sentinel => Value::Null,
        other => other.clone(),
    }
}

/// Normalized identity key text: rendered and trimmed. `None` when blank.
pub fn identity_text(value: &Value) -> Option<String> {
    let s = value.render();
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Site comparison text: rendered and trimmed.
pub fn site_text(value: &Value) -> String {
    value.render().trim().to_string()
}
