//! Error types for saptune
//!
//! Every note lifecycle phase reports failures through [`SaptuneError`].
//! Accessors surface I/O problems as typed errors; the note that called them
//! wraps them with the phase and parameter that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for saptune operations
#[derive(Error, Debug)]
pub enum SaptuneError {
    /// A required live value could not be read while inspecting a note
    #[error("Inspection of note {note} failed at '{parameter}': {reason}")]
    Inspection {
        note: String,
        parameter: String,
        reason: String,
    },

    /// An override file exists but cannot be parsed
    #[error("Malformed configuration in '{path}' at line {line}: {message}")]
    ConfigParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Writing a parameter failed
    #[error("Failed to apply '{parameter}': {source}")]
    Apply {
        parameter: String,
        #[source]
        source: Box<SaptuneError>,
    },

    /// A previously discovered resource disappeared before it was written
    #[error("Resource vanished: {0}")]
    MissingResource(String),

    /// I/O error with path context
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value read from the system could not be interpreted
    #[error("Malformed value for '{key}': {value:?}")]
    MalformedValue { key: String, value: String },

    /// No note with the given id is registered
    #[error("Unknown note: {0}")]
    UnknownNote(String),

    /// External command failed
    #[error("Command '{program}' failed: {message}")]
    Command { program: String, message: String },

    /// Snapshot could not be written or read back
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Operation not available on this platform
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl SaptuneError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an inspection error for a note parameter
    pub fn inspection(
        note: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Inspection {
            note: note.into(),
            parameter: parameter.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration parse error
    pub fn config_parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a command failure
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Wrap this error as the failure to apply one parameter.
    ///
    /// A vanished resource stays a `MissingResource` so callers can still
    /// recognise it as non-fatal.
    pub fn applying(self, parameter: impl Into<String>) -> Self {
        match self {
            Self::MissingResource(_) => self,
            other => Self::Apply {
                parameter: parameter.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check if this error only reports a vanished resource
    pub fn is_missing_resource(&self) -> bool {
        matches!(self, Self::MissingResource(_))
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            Self::Apply { source, .. } => source.is_permission_error(),
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::ConfigParse { path, .. } => Some(path),
            Self::Apply { source, .. } => source.path(),
            _ => None,
        }
    }
}

/// Result type alias for saptune operations
pub type Result<T> = std::result::Result<T, SaptuneError>;

impl From<std::io::Error> for SaptuneError {
    fn from(err: std::io::Error) -> Self {
        SaptuneError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SaptuneError {
    fn from(err: serde_json::Error) -> Self {
        SaptuneError::Snapshot(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SaptuneError::io(path, e))
    }
}
