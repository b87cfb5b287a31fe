// rackrecon CLI - reconcile two inventory exports for one site

mod compare;
mod exit_codes;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "rackrecon")]
#[command(about = "Reconcile two inventory exports: field differences and missing assets")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log output (-v info, -vv debug). RACKRECON_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare source A (filtered to one site) against source B
    #[command(after_help = "\
Examples:
  rackrecon compare sm_test_data.xlsx sf_test_data.xlsx --site SITE_03
  rackrecon compare sm.csv sf.csv --site SITE_03 --config audit.recon.toml
  rackrecon compare sm.xlsx sf.xlsx --site SITE_03 --format csv --differences out/diffs.csv
  rackrecon compare sm.xlsx sf.xlsx --site SITE_03 --json --summary-only
  rackrecon compare sm.xlsx sf.xlsx --site SITE_03 --json-out run.json
  rackrecon compare sm.xlsx sf.xlsx --site SITE_03 --strict-exit || echo \"sources differ\"")]
    Compare {
        /// Source A export (xlsx, xls, xlsb, ods, csv, tsv)
        a: PathBuf,

        /// Source B export
        b: PathBuf,

        /// Site value used to filter source A
        #[arg(long, env = "RACKRECON_SITE")]
        site: String,

        /// Path to a .recon.toml config (built-in defaults when omitted)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Field-difference report path (overrides config)
        #[arg(long)]
        differences: Option<PathBuf>,

        /// Existence-difference report path (overrides config)
        #[arg(long)]
        existence: Option<PathBuf>,

        /// Report file format
        #[arg(long, value_enum, default_value = "xlsx")]
        format: ReportFormatArg,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the full result as JSON to a file (also with --summary-only)
        #[arg(long, value_name = "PATH")]
        json_out: Option<PathBuf>,

        /// Do not write report files
        #[arg(long)]
        summary_only: bool,

        /// Exit 1 when any difference is found
        #[arg(long)]
        strict_exit: bool,
    },

    /// Parse and validate a config file, then print its effective settings
    #[command(after_help = "\
Examples:
  rackrecon validate audit.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print the effective comparison field list, one per line
    #[command(after_help = "\
Examples:
  rackrecon fields
  rackrecon fields --config audit.recon.toml")]
    Fields {
        /// Path to a .recon.toml config (built-in defaults when omitted)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormatArg {
    Xlsx,
    Csv,
}

impl From<ReportFormatArg> for rackrecon_io::ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Xlsx => rackrecon_io::ReportFormat::Xlsx,
            ReportFormatArg::Csv => rackrecon_io::ReportFormat::Csv,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  rackrecon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr log subscriber. `log` records from the library
/// crates are bridged into it.
fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("RACKRECON_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Compare {
            a,
            b,
            site,
            config,
            differences,
            existence,
            format,
            json,
            json_out,
            summary_only,
            strict_exit,
        } => compare::cmd_compare(compare::CompareArgs {
            a,
            b,
            site,
            config,
            differences,
            existence,
            format: format.into(),
            json,
            json_out,
            summary_only,
            strict_exit,
            quiet: cli.quiet,
        }),
        Commands::Validate { config } => settings::cmd_validate(&config),
        Commands::Fields { config } => settings::cmd_fields(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Exit with `code` without printing anything.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Create error from an engine error with the registry's exit code.
    pub fn recon(err: rackrecon::ReconError) -> Self {
        use rackrecon::ReconError;

        let hint = match &err {
            ReconError::Schema { .. } => {
                Some("check [keys] in the config against the file's header row".to_string())
            }
            ReconError::DataFormat { field, .. } => Some(format!(
                "'{field}' is zero-padded before comparison; \
                 fix the cell or drop it from [normalize] pad"
            )),
            ReconError::Input(_) => Some("pass a non-blank --site value".to_string()),
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => None,
        };
        Self { code: exit_codes::recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
