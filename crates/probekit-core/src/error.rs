//! Error types for probekit operations.
//!
//! The `Display` text of every variant is the diagnostic a check plugin
//! prints, so the wording is part of the public contract.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of any probekit operation.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUnicodePath(PathBuf),

    #[error("Invalid {kind} pattern {pattern:?}: {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error \"{reason}\" while opening or reading {path}")]
    Io { reason: String, path: String },

    #[error("Unknown error opening or reading {0}")]
    Unreadable(String),

    #[error("no match")]
    NoMatch,

    #[error("Login failed")]
    LoginFailed,

    #[error("The file that was specified as a target is a directory, should be a file.")]
    TargetIsDirectory,

    #[error("No such file or directory on the smb server.")]
    RemoteNotFound,

    #[error("Unknown error opening or reading {path}:\n{detail}")]
    Unknown { path: String, detail: String },

    #[error("Invalid SMB path {0:?}, expected \\\\server\\share[\\path]")]
    InvalidSmbPath(String),

    #[error("Invalid glob pattern {pattern:?}: {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Failed to read mount table {path}: {reason}")]
    MountTable { path: String, reason: String },

    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),
}

/// Result type for probekit operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    /// Wrap an I/O failure on `path`, keeping only the OS reason text.
    pub fn io(err: &std::io::Error, path: impl Into<String>) -> Self {
        ProbeError::Io {
            reason: os_reason(err),
            path: path.into(),
        }
    }
}

/// The OS error text without the trailing `(os error N)` that
/// `std::io::Error` appends.
pub(crate) fn os_reason(err: &std::io::Error) -> String {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => text
            .strip_suffix(&format!(" (os error {code})"))
            .map(str::to_string)
            .unwrap_or(text),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_mentions_reason_and_path() {
        let io_err = std::io::Error::from_raw_os_error(2);
        let err = ProbeError::io(&io_err, "/nonexistent/file");
        let msg = err.to_string();
        assert!(msg.starts_with("I/O error \""), "got {msg}");
        assert!(msg.ends_with("while opening or reading /nonexistent/file"));
        assert!(!msg.contains("os error"), "os suffix must be stripped: {msg}");
    }

    #[test]
    fn custom_io_error_keeps_full_text() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert_eq!(os_reason(&io_err), "disk on fire");
    }

    #[test]
    fn smb_messages_are_fixed() {
        assert_eq!(ProbeError::LoginFailed.to_string(), "Login failed");
        assert_eq!(
            ProbeError::RemoteNotFound.to_string(),
            "No such file or directory on the smb server."
        );
        assert_eq!(
            ProbeError::TargetIsDirectory.to_string(),
            "The file that was specified as a target is a directory, should be a file."
        );
    }

    #[test]
    fn unknown_error_includes_detail() {
        let err = ProbeError::Unknown {
            path: r"\\srv\share\a.txt".into(),
            detail: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown error opening or reading \\\\srv\\share\\a.txt:\nboom"
        );
    }
}
