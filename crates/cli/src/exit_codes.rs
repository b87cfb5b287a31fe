//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Differences found (only with `--strict-exit`)        |
//! | 2    | Usage error (bad arguments)                          |
//! | 3    | Schema error: a required column is missing           |
//! | 4    | Data format error: a pad column holds a non-integer  |
//! | 5    | Input error: file missing, unreadable, or blank site |
//! | 6    | Config error: TOML parse or validation failure       |
//! | 7    | Output error: a report could not be written          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the command's error handling

use rackrecon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found. Like `diff(1)`, exit 1 means "files differ."
pub const EXIT_DIFFS_FOUND: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code itself on parse failures.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Identity or site column missing from a dataset.
pub const EXIT_SCHEMA: u8 = 3;

/// A pad column value is neither an integer nor blank.
pub const EXIT_DATA_FORMAT: u8 = 4;

/// Input file not found or unreadable, or blank site value.
pub const EXIT_INPUT: u8 = 5;

/// Config file unreadable, malformed, or invalid.
pub const EXIT_CONFIG: u8 = 6;

/// A report file could not be written.
pub const EXIT_OUTPUT: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Schema { .. } => EXIT_SCHEMA,
        ReconError::DataFormat { .. } => EXIT_DATA_FORMAT,
        ReconError::Input(_) => EXIT_INPUT,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
    }
}
