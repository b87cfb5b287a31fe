use std::collections::BTreeMap;

use crate::align::{align, AlignOptions};
use crate::compare::compare_fields;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::existence::{compare_existence, ExistenceOptions};
use crate::model::{
    AlignStats, Dataset, ExistenceDifference, FieldDifference, ReconMeta, ReconResult,
    ReconSummary, Side,
};

/// Run both passes for one site. Returns nothing partial: any error aborts.
pub fn run(
    config: &ReconConfig,
    a: &Dataset,
    b: &Dataset,
    site: &str,
) -> Result<ReconResult, ReconError> {
    let site = site.trim();
    if site.is_empty() {
        return Err(ReconError::Input("site value must not be blank".into()));
    }

    let alignment = align(a, b, site, &AlignOptions::from_config(config))?;
    let differences = compare_fields(&alignment, &config.compare, &config.normalize.sentinel);
    let existence = compare_existence(a, b, site, &ExistenceOptions::from_config(config))?;

    let summary = compute_summary(
        &alignment.stats,
        alignment.keys.len(),
        alignment.keys_in_both(),
        &differences,
        &existence,
    );

    log::info!(
        "site '{}': {} field differences across {} shared keys, {} only in {}, {} only in {}",
        site,
        summary.field_differences,
        summary.keys_in_both,
        summary.only_in_a,
        config.label_a(),
        summary.only_in_b,
        config.label_b()
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            site: site.to_string(),
            identity_column: config.keys.identity.clone(),
            source_a: config.label_a().to_string(),
            source_b: config.label_b().to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        differences,
        existence,
    })
}

fn compute_summary(
    stats: &AlignStats,
    unified_keys: usize,
    keys_in_both: usize,
    differences: &[FieldDifference],
    existence: &[ExistenceDifference],
) -> ReconSummary {
    let mut differences_by_field: BTreeMap<String, usize> = BTreeMap::new();
    for d in differences {
        *differences_by_field.entry(d.field.clone()).or_insert(0) += 1;
    }

    ReconSummary {
        alignment: stats.clone(),
        unified_keys,
        keys_in_both,
        field_differences: differences.len(),
        differences_by_field,
        only_in_a: existence.iter().filter(|e| e.only_in == Side::A).count(),
        only_in_b: existence.iter().filter(|e| e.only_in == Side::B).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn inventory() -> (Dataset, Dataset) {
        let mut a = Dataset::new("sm.xlsx", ["Physical UHN", "Site ID", "Status", "Node"]);
        a.push_row([
            ("Physical UHN", Value::text("X1")),
            ("Site ID", Value::text("S1")),
            ("Status", Value::text("Live")),
            ("Node", Value::Number(5.0)),
        ]);
        a.push_row([
            ("Physical UHN", Value::text("X2")),
            ("Site ID", Value::text("S1")),
            ("Status", Value::text("-")),
            ("Node", Value::Null),
        ]);
        a.push_row([
            ("Physical UHN", Value::text("X4")),
            ("Site ID", Value::text("S2")),
            ("Status", Value::text("Live")),
            ("Node", Value::text("bad")),
        ]);

        let mut b = Dataset::new("sf.xlsx", ["Physical UHN", "Status", "Node"]);
        b.push_row([
            ("Physical UHN", Value::text("X1")),
            ("Status", Value::text("Retired")),
            ("Node", Value::text("005")),
        ]);
        b.push_row([
            ("Physical UHN", Value::text("X2")),
            ("Status", Value::Null),
            ("Node", Value::Null),
        ]);
        b.push_row([
            ("Physical UHN", Value::text("X3")),
            ("Status", Value::text("Live")),
            ("Node", Value::Null),
        ]);
        (a, b)
    }

    fn config() -> ReconConfig {
        ReconConfig::from_toml(r#"compare = ["Status", "Node", "Mac Address"]"#).unwrap()
    }

    #[test]
    fn run_reports_both_passes() {
        let (a, b) = inventory();
        let result = run(&config(), &a, &b, "S1").unwrap();

        // X1 Status differs; X1 + X2 lack Mac Address on both sides
        assert_eq!(result.summary.field_differences, 3);
        assert_eq!(result.summary.differences_by_field["Status"], 1);
        assert_eq!(result.summary.differences_by_field["Mac Address"], 2);
        assert_eq!(result.summary.keys_in_both, 2);
        assert_eq!(result.summary.unified_keys, 3);
        assert_eq!(result.summary.alignment.a_rows_in_site, 2);
        assert_eq!(result.summary.only_in_a, 0);
        assert_eq!(result.summary.only_in_b, 1);
        assert_eq!(result.existence[0].key, "X3");
        assert_eq!(result.existence[0].source, "sf_test_data.xlsx");
        assert!(result.has_differences());
        assert_eq!(result.meta.site, "S1");
    }

    #[test]
    fn blank_site_is_input_error() {
        let (a, b) = inventory();
        let err = run(&config(), &a, &b, "   ").unwrap_err();
        assert!(matches!(err, ReconError::Input(_)));
    }

    #[test]
    fn data_format_error_aborts_run() {
        let (a, b) = inventory();
        let err = run(&config(), &a, &b, "S2").unwrap_err();
        assert!(matches!(err, ReconError::DataFormat { row: 4, .. }));
    }

    #[test]
    fn clean_run_has_no_differences() {
        let (a, _) = inventory();
        let mut b = Dataset::new("sf.xlsx", ["Physical UHN", "Status", "Node"]);
        b.push_row([
            ("Physical UHN", Value::text("X1")),
            ("Status", Value::text("Live")),
            ("Node", Value::text("5")),
        ]);
        b.push_row([("Physical UHN", Value::text("X2"))]);
        let config = ReconConfig::from_toml(r#"compare = ["Status", "Node"]"#).unwrap();
        let result = run(&config, &a, &b, "S1").unwrap();
        assert!(!result.has_differences(), "{:?}", result.differences);
    }

    #[test]
    fn result_serializes_to_json() {
        let (a, b) = inventory();
        let result = run(&config(), &a, &b, "S1").unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["a_rows"], 3);
        assert_eq!(json["existence"][0]["only_in"], "b");
        assert_eq!(json["differences"][0]["key"], "X1");
    }
}
