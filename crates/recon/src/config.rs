use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Comparison fields used when a config does not list its own.
pub const DEFAULT_COMPARE_FIELDS: [&str; 24] = [
    "Status",
    "Site ID",
    "Building Name",
    "Floor Name",
    "Room Name",
    "Zone Name",
    "Row Name",
    "Rack Name",
    "POD Code",
    "Material Name",
    "Device Role",
    "Node",
    "Serial Number",
    "Mac Address",
    "Material Start Slot Number",
    "Material End Slot Number",
    "Number of Slots",
    "Product Number",
    "Material Code",
    "Rack Sequence Number",
    "Logical UHN",
    "Cluster Code",
    "Server Modified",
    "Current SKU Type",
];

const MAX_PAD_WIDTH: usize = 18;

/// Second column of the field-difference report.
pub const AFFECTED_COLUMN_HEADER: &str = "Affected Column(s)";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_compare")]
    pub compare: Vec<String>,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            compare: default_compare(),
            keys: KeyConfig::default(),
            normalize: NormalizeConfig::default(),
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_name() -> String {
    "SM vs SF inventory".into()
}

fn default_compare() -> Vec<String> {
    DEFAULT_COMPARE_FIELDS.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Column that identifies a physical unit on both sides.
    #[serde(default = "default_identity")]
    pub identity: String,
    /// Column on source A filtered by the run's site value.
    #[serde(default = "default_site")]
    pub site: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            site: default_site(),
        }
    }
}

fn default_identity() -> String {
    "Physical UHN".into()
}

fn default_site() -> String {
    "Site ID".into()
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Source-A placeholder compared as blank.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    #[serde(default = "default_pad")]
    pub pad: Vec<PadField>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
            pad: default_pad(),
        }
    }
}

fn default_sentinel() -> String {
    "-".into()
}

fn default_pad() -> Vec<PadField> {
    vec![PadField {
        column: "Node".into(),
        width: 3,
    }]
}

/// A column re-rendered as a zero-padded integer on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PadField {
    pub column: String,
    pub width: usize,
}

// ---------------------------------------------------------------------------
// Sources + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    #[serde(default)]
    pub a: SourceConfig,
    #[serde(default)]
    pub b: SourceConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Name written into existence reports. Falls back to the file name.
    #[serde(default)]
    pub label: Option<String>,
    /// Worksheet to read. First sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
}

pub const DEFAULT_LABEL_A: &str = "sm_test_data.xlsx";
pub const DEFAULT_LABEL_B: &str = "sf_test_data.xlsx";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_differences_path")]
    pub differences: String,
    #[serde(default = "default_existence_path")]
    pub existence: String,
    #[serde(default = "default_value_a_header")]
    pub value_a_header: String,
    #[serde(default = "default_value_b_header")]
    pub value_b_header: String,
    #[serde(default = "default_existence_header")]
    pub existence_header: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            differences: default_differences_path(),
            existence: default_existence_path(),
            value_a_header: default_value_a_header(),
            value_b_header: default_value_b_header(),
            existence_header: default_existence_header(),
        }
    }
}

fn default_differences_path() -> String {
    "differences.xlsx".into()
}

fn default_existence_path() -> String {
    "uhn_differences.xlsx".into()
}

fn default_value_a_header() -> String {
    "SM DATA".into()
}

fn default_value_b_header() -> String {
    "SF DATA".into()
}

fn default_existence_header() -> String {
    "Differences found in file:".into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.compare = config.compare.iter().map(|c| c.trim().to_string()).collect();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.keys.identity.trim().is_empty() {
            return Err(ReconError::ConfigValidation("keys.identity must not be empty".into()));
        }
        if self.keys.site.trim().is_empty() {
            return Err(ReconError::ConfigValidation("keys.site must not be empty".into()));
        }

        if self.compare.is_empty() {
            return Err(ReconError::ConfigValidation(
                "compare must list at least one column".into(),
            ));
        }
        for (i, field) in self.compare.iter().enumerate() {
            if field.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "compare[{i}] is empty"
                )));
            }
            if self.compare[..i].contains(field) {
                return Err(ReconError::ConfigValidation(format!(
                    "compare lists '{field}' more than once"
                )));
            }
        }

        for pad in &self.normalize.pad {
            if pad.width == 0 || pad.width > MAX_PAD_WIDTH {
                return Err(ReconError::ConfigValidation(format!(
                    "pad '{}': width must be between 1 and {MAX_PAD_WIDTH}, got {}",
                    pad.column, pad.width
                )));
            }
            if pad.column.trim() == self.keys.identity.trim() {
                return Err(ReconError::ConfigValidation(format!(
                    "pad '{}': the identity column cannot be padded",
                    pad.column
                )));
            }
        }

        let identity = self.keys.identity.trim();
        unique_headers(
            "differences",
            &[
                identity,
                AFFECTED_COLUMN_HEADER,
                &self.output.value_a_header,
                &self.output.value_b_header,
            ],
        )?;
        unique_headers("existence", &[identity, &self.output.existence_header])?;

        if self.label_a() == self.label_b() {
            return Err(ReconError::ConfigValidation(format!(
                "sources.a and sources.b share the label '{}'",
                self.label_a()
            )));
        }

        Ok(())
    }

    pub fn label_a(&self) -> &str {
        self.sources.a.label.as_deref().unwrap_or(DEFAULT_LABEL_A)
    }

    pub fn label_b(&self) -> &str {
        self.sources.b.label.as_deref().unwrap_or(DEFAULT_LABEL_B)
    }
}

/// Report headers become Excel table column names, which must be non-empty
/// and unique ignoring case.
fn unique_headers(report: &str, headers: &[&str]) -> Result<(), ReconError> {
    for (i, header) in headers.iter().enumerate() {
        let header = header.trim();
        if header.is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "{report} report: column header {} is empty",
                i + 1
            )));
        }
        let folded = header.to_lowercase();
        if headers[..i].iter().any(|h| h.trim().to_lowercase() == folded) {
            return Err(ReconError::ConfigValidation(format!(
                "{report} report: column header '{header}' appears more than once \
                 (case-insensitive)"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_matches_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.keys.identity, "Physical UHN");
        assert_eq!(config.keys.site, "Site ID");
        assert_eq!(config.compare.len(), 24);
        assert_eq!(config.compare[11], "Node");
        assert_eq!(config.normalize.sentinel, "-");
        assert_eq!(config.normalize.pad, vec![PadField { column: "Node".into(), width: 3 }]);
        assert_eq!(config.label_a(), "sm_test_data.xlsx");
        assert_eq!(config.label_b(), "sf_test_data.xlsx");
        assert_eq!(config.output.differences, "differences.xlsx");
        assert_eq!(config.output.existence, "uhn_differences.xlsx");
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
name = "Rack audit"
compare = ["Status", " Rack Name ", "Node"]

[keys]
identity = "UHN"
site = "Site"

[normalize]
sentinel = "N/A"
pad = [{ column = "Node", width = 4 }, { column = "Slot", width = 2 }]

[sources.a]
label = "asset_mgmt.xlsx"
sheet = "Export"

[sources.b]
label = "field_svc.xlsx"

[output]
differences = "out/diff.xlsx"
value_a_header = "AM"
value_b_header = "FS"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "Rack audit");
        assert_eq!(config.compare, vec!["Status", "Rack Name", "Node"]);
        assert_eq!(config.keys.identity, "UHN");
        assert_eq!(config.normalize.sentinel, "N/A");
        assert_eq!(config.normalize.pad.len(), 2);
        assert_eq!(config.sources.a.sheet.as_deref(), Some("Export"));
        assert_eq!(config.label_b(), "field_svc.xlsx");
        assert_eq!(config.output.value_a_header, "AM");
        // Unset output fields keep defaults
        assert_eq!(config.output.existence, "uhn_differences.xlsx");
    }

    #[test]
    fn reject_unknown_key() {
        let err = ReconConfig::from_toml("[keys]\nidentiy = \"UHN\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_compare() {
        let err = ReconConfig::from_toml("compare = []").unwrap_err();
        assert!(err.to_string().contains("at least one column"));
    }

    #[test]
    fn reject_duplicate_compare_field() {
        let err = ReconConfig::from_toml(r#"compare = ["Node", "Node "]"#).unwrap_err();
        assert!(err.to_string().contains("'Node' more than once"));
    }

    #[test]
    fn reject_bad_pad_width() {
        let err = ReconConfig::from_toml(
            "[normalize]\npad = [{ column = \"Node\", width = 0 }]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("width must be between 1 and 18"));
    }

    #[test]
    fn reject_padding_identity_column() {
        let err = ReconConfig::from_toml(
            "[normalize]\npad = [{ column = \"Physical UHN\", width = 3 }]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("identity column"));
    }

    #[test]
    fn reject_shared_labels() {
        let err = ReconConfig::from_toml(
            "[sources.a]\nlabel = \"x.xlsx\"\n[sources.b]\nlabel = \"x.xlsx\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("share the label"));
    }

    #[test]
    fn reject_duplicate_value_headers() {
        let err = ReconConfig::from_toml(
            "[output]\nvalue_a_header = \"DATA\"\nvalue_b_header = \"DATA\"\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReconError::ConfigValidation(
                "differences report: column header 'DATA' appears more than once (case-insensitive)"
                    .into()
            )
        );
    }

    #[test]
    fn reject_headers_clashing_with_fixed_columns() {
        for output in [
            "value_a_header = \"physical uhn\"",
            "value_b_header = \"AFFECTED COLUMN(S)\"",
            "existence_header = \"Physical UHN\"",
            "value_a_header = \"  \"",
        ] {
            let err = ReconConfig::from_toml(&format!("[output]\n{output}\n")).unwrap_err();
            assert!(
                matches!(err, ReconError::ConfigValidation(_)),
                "{output} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn existence_header_may_match_value_header() {
        // The two reports are separate tables
        let config = ReconConfig::from_toml(
            "[output]\nvalue_a_header = \"Source\"\nexistence_header = \"Source\"\n",
        );
        assert!(config.is_ok());
    }
}
