//! `rackrecon validate` and `rackrecon fields`.

use std::io::{self, Write};
use std::path::Path;

use rackrecon::ReconConfig;

use crate::exit_codes::{EXIT_CONFIG, EXIT_OUTPUT};
use crate::CliError;

/// Read and validate a config, or the built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        log::debug!("no --config given, using built-in defaults");
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_CONFIG, format!("{}: {e}", path.display()))
            .with_hint("run `rackrecon validate <config>` to check it")
    })
}

pub fn cmd_validate(path: &Path) -> Result<(), CliError> {
    let config = load_config(Some(path))?;
    let pad: Vec<String> = config
        .normalize
        .pad
        .iter()
        .map(|p| format!("{}({})", p.column, p.width))
        .collect();

    let mut out = io::stdout().lock();
    let report = format!(
        "config ok: {}\n\
         \x20 name:         {}\n\
         \x20 identity:     {}\n\
         \x20 site column:  {}\n\
         \x20 compare:      {} fields\n\
         \x20 sentinel:     {:?}\n\
         \x20 pad:          {}\n\
         \x20 source a:     {}\n\
         \x20 source b:     {}\n\
         \x20 differences:  {}\n\
         \x20 existence:    {}\n",
        path.display(),
        config.name,
        config.keys.identity,
        config.keys.site,
        config.compare.len(),
        config.normalize.sentinel,
        if pad.is_empty() { "none".to_string() } else { pad.join(", ") },
        config.label_a(),
        config.label_b(),
        config.output.differences,
        config.output.existence,
    );
    out.write_all(report.as_bytes())
        .map_err(|e| CliError::new(EXIT_OUTPUT, e.to_string()))
}

pub fn cmd_fields(path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(path)?;
    let mut out = io::stdout().lock();
    for field in &config.compare {
        writeln!(out, "{field}").map_err(|e| CliError::new(EXIT_OUTPUT, e.to_string()))?;
    }
    Ok(())
}
