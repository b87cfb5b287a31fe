use std::fmt;
use std::path::{Path, PathBuf};

/// Failure to turn a file into a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NotFound(PathBuf),
    UnsupportedFormat { path: PathBuf, extension: String },
    Read { path: PathBuf, message: String },
    NoSheets(PathBuf),
    SheetNotFound { path: PathBuf, sheet: String, available: Vec<String> },
    NoHeader(PathBuf),
}

impl LoadError {
    pub(crate) fn read(path: &Path, message: impl fmt::Display) -> Self {
        LoadError::Read {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "{}: file not found", path.display()),
            LoadError::UnsupportedFormat { path, extension } => {
                if extension.is_empty() {
                    write!(f, "{}: no file extension, cannot pick a reader", path.display())
                } else {
                    write!(f, "{}: unsupported file type '.{}'", path.display(), extension)
                }
            }
            LoadError::Read { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
            LoadError::NoSheets(path) => {
                write!(f, "{}: workbook contains no sheets", path.display())
            }
            LoadError::SheetNotFound { path, sheet, available } => write!(
                f,
                "{}: sheet '{}' not found (available: {})",
                path.display(),
                sheet,
                available.join(", ")
            ),
            LoadError::NoHeader(path) => {
                write!(f, "{}: no header row found, file is empty", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Failure to write a report artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportError {
    pub path: PathBuf,
    pub message: String,
}

impl ReportError {
    pub(crate) fn new(path: &Path, message: impl fmt::Display) -> Self {
        ReportError {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to write {}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for ReportError {}
