use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty field list, bad pad width, etc.).
    ConfigValidation(String),
    /// Required column (identity key or site) missing from a dataset.
    Schema { dataset: String, column: String },
    /// A pad-field value is neither numeric nor null.
    DataFormat {
        dataset: String,
        field: String,
        row: usize,
        value: String,
    },
    /// No input provided, unreadable source, or blank site value.
    Input(String),
}

impl ReconError {
    pub fn schema(dataset: &str, column: &str) -> Self {
        Self::Schema {
            dataset: dataset.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Schema { dataset, column } => {
                write!(f, "{dataset}: missing required column '{column}'")
            }
            Self::DataFormat { dataset, field, row, value } => {
                write!(
                    f,
                    "{dataset}, row {row}: column '{field}' expects an integer, found '{value}'"
                )
            }
            Self::Input(msg) => write!(f, "input error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = ReconError::schema("sm.xlsx", "Physical UHN");
        assert_eq!(e.to_string(), "sm.xlsx: missing required column 'Physical UHN'");

        let e = ReconError::DataFormat {
            dataset: "sf.xlsx".into(),
            field: "Node".into(),
            row: 7,
            value: "n/a".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("row 7"));
        assert!(msg.contains("'Node'"));
        assert!(msg.contains("'n/a'"));
    }
}
