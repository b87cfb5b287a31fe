// JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rackrecon::ReconResult;

use crate::error::ReportError;

/// Export the full run result (meta, summary and both difference lists).
pub fn export(result: &ReconResult, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|e| ReportError::new(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result).map_err(|e| ReportError::new(path, e))?;
    writeln!(writer).map_err(|e| ReportError::new(path, e))?;
    writer.flush().map_err(|e| ReportError::new(path, e))?;
    Ok(())
}

pub fn to_string(result: &ReconResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackrecon::model::Dataset;
    use rackrecon::ReconConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_json_export() {
        let mut a = Dataset::new("a", ["Physical UHN", "Site ID", "Status"]);
        a.push_row([("Physical UHN", "U1"), ("Site ID", "S1"), ("Status", "Live")]);
        let mut b = Dataset::new("b", ["Physical UHN", "Status"]);
        b.push_row([("Physical UHN", "U1"), ("Status", "Retired")]);
        let config = ReconConfig::from_toml(r#"compare = ["Status"]"#).unwrap();
        let result = rackrecon::run(&config, &a, &b, "S1").unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("result.json");
        export(&result, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["meta"]["site"], "S1");
        assert_eq!(parsed["summary"]["field_differences"], 1);
        assert_eq!(parsed["differences"][0]["a"], "Live");
        assert_eq!(parsed["differences"][0]["b"], "Retired");
        assert_eq!(parsed["existence"], serde_json::json!([]));
    }
}
