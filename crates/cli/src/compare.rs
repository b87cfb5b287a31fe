//! `rackrecon compare`: load both sources, run, write reports.

use std::path::{Path, PathBuf};

use rackrecon::model::Side;
use rackrecon::{ReconConfig, ReconResult};
use rackrecon_io::{LoadError, LoadOptions, ReportFormat, ReportPaths};

use crate::exit_codes::{EXIT_CONFIG, EXIT_DIFFS_FOUND, EXIT_INPUT, EXIT_OUTPUT};
use crate::settings::load_config;
use crate::CliError;

pub struct CompareArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    pub site: String,
    pub config: Option<PathBuf>,
    pub differences: Option<PathBuf>,
    pub existence: Option<PathBuf>,
    pub format: ReportFormat,
    pub json: bool,
    pub json_out: Option<PathBuf>,
    pub summary_only: bool,
    pub strict_exit: bool,
    pub quiet: bool,
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    apply_file_labels(&mut config, &args.a, &args.b);
    config
        .validate()
        .map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))?;

    let a = load_side(&args.a, &config, Side::A)?;
    let b = load_side(&args.b, &config, Side::B)?;

    let result = rackrecon::run(&config, &a, &b, &args.site).map_err(CliError::recon)?;

    let paths = if args.summary_only {
        None
    } else {
        let mut paths = ReportPaths::from_config(&config, args.format);
        if let Some(p) = args.differences {
            paths.differences = p;
        }
        if let Some(p) = args.existence {
            paths.existence = p;
        }
        rackrecon_io::write_reports(&result, &config, &paths, args.format)
            .map_err(|e| CliError::new(EXIT_OUTPUT, e.to_string()))?;
        Some(paths)
    };

    if let Some(path) = &args.json_out {
        rackrecon_io::json::export(&result, path)
            .map_err(|e| CliError::new(EXIT_OUTPUT, e.to_string()))?;
        log::info!("wrote run result to {}", path.display());
    }

    if args.json {
        let json = rackrecon_io::json::to_string(&result)
            .map_err(|e| CliError::new(EXIT_OUTPUT, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    if !args.quiet {
        print_summary(&result, paths.as_ref());
    }

    if args.strict_exit && result.has_differences() {
        return Err(CliError::silent(EXIT_DIFFS_FOUND));
    }
    Ok(())
}

/// Sources without a configured label are named after their file.
fn apply_file_labels(config: &mut ReconConfig, a: &Path, b: &Path) {
    let mut label_a = file_label(a);
    let mut label_b = file_label(b);
    if label_a == label_b {
        label_a = a.display().to_string();
        label_b = b.display().to_string();
    }
    if label_a == label_b {
        label_a = format!("{label_a} (a)");
        label_b = format!("{label_b} (b)");
    }
    config.sources.a.label.get_or_insert(label_a);
    config.sources.b.label.get_or_insert(label_b);
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_side(
    path: &Path,
    config: &ReconConfig,
    side: Side,
) -> Result<rackrecon::Dataset, CliError> {
    let options = LoadOptions::for_side(config, side);
    rackrecon_io::load_dataset(path, &options).map_err(|e| {
        let hint = match &e {
            LoadError::UnsupportedFormat { .. } => {
                Some("supported: xlsx, xlsm, xls, xlsb, ods, csv, tsv, txt")
            }
            LoadError::SheetNotFound { .. } => {
                Some("set sources.a.sheet / sources.b.sheet in the config")
            }
            _ => None,
        };
        let err = CliError::new(EXIT_INPUT, e.to_string());
        match hint {
            Some(h) => err.with_hint(h),
            None => err,
        }
    })
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult, paths: Option<&ReportPaths>) {
    let s = &result.summary;
    let m = &result.meta;
    eprintln!(
        "site {}: {} of {} rows in {}, {} rows in {}",
        m.site,
        s.alignment.a_rows_in_site,
        s.alignment.a_rows,
        m.source_a,
        s.alignment.b_rows,
        m.source_b
    );
    if s.alignment.a_duplicates_dropped + s.alignment.b_duplicates_dropped > 0 {
        eprintln!(
            "  duplicates dropped: {} in {}, {} in {}",
            s.alignment.a_duplicates_dropped,
            m.source_a,
            s.alignment.b_duplicates_dropped,
            m.source_b
        );
    }
    eprintln!(
        "  {} shared keys, {} field differences",
        s.keys_in_both, s.field_differences
    );
    for (field, count) in &s.differences_by_field {
        eprintln!("    {field}: {count}");
    }
    eprintln!(
        "  only in {}: {}, only in {}: {}",
        m.source_a, s.only_in_a, m.source_b, s.only_in_b
    );
    if let Some(paths) = paths {
        eprintln!(
            "wrote {} and {}",
            paths.differences.display(),
            paths.existence.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_to_file_names() {
        let mut config = ReconConfig::default();
        apply_file_labels(&mut config, Path::new("in/sm.xlsx"), Path::new("in/sf.xlsx"));
        assert_eq!(config.label_a(), "sm.xlsx");
        assert_eq!(config.label_b(), "sf.xlsx");
    }

    #[test]
    fn same_file_names_use_full_paths() {
        let mut config = ReconConfig::default();
        apply_file_labels(&mut config, Path::new("old/export.xlsx"), Path::new("new/export.xlsx"));
        assert_eq!(config.label_a(), "old/export.xlsx");
        assert_eq!(config.label_b(), "new/export.xlsx");
    }

    #[test]
    fn same_path_for_both_sides_gets_suffixes() {
        let mut config = ReconConfig::default();
        apply_file_labels(&mut config, Path::new("in/export.xlsx"), Path::new("in/export.xlsx"));
        assert_eq!(config.label_a(), "in/export.xlsx (a)");
        assert_eq!(config.label_b(), "in/export.xlsx (b)");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn configured_labels_win() {
        let mut config =
            ReconConfig::from_toml("[sources.a]\nlabel = \"SM\"\n").unwrap();
        apply_file_labels(&mut config, Path::new("sm.xlsx"), Path::new("sf.xlsx"));
        assert_eq!(config.label_a(), "SM");
        assert_eq!(config.label_b(), "sf.xlsx");
    }
}
