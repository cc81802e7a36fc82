/// SMB file access — open a remote file or list a remote directory.
///
/// The protocol itself lives in an external client library behind the
/// [`SmbBackend`] trait. This module owns the parts check plugins rely on:
/// UNC path parsing, glob filtering and the translation of client failures
/// ([`SmbError`]) into fixed, human-readable diagnostics ([`ProbeError`]).
///
/// The two operations treat a missing target differently on purpose:
/// [`open_file`] needs the file to exist and fails, while [`glob`] reports
/// an absent path as an empty listing.
///
/// Every call opens its own connection and closes it before returning.
#[cfg(feature = "smb")]
pub mod client;
pub mod path;

use crate::error::{ProbeError, Result};
use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Read};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub use path::SmbPath;

/// Failure reported by an [`SmbBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmbError {
    #[error("authentication failed")]
    AuthFailed,
    #[error("no such file or directory")]
    NotFound,
    #[error("is a directory")]
    IsADirectory,
    #[error("{detail}")]
    Io { detail: String },
    #[error("{detail}")]
    Unknown { detail: String },
}

/// Credentials and connection settings for one call.
#[derive(Clone)]
pub struct SmbConnectOptions {
    pub username: String,
    pub password: String,
    /// Connection timeout.
    pub timeout: Duration,
    /// Require an encrypted session. Defaults to `true`.
    pub encrypt: bool,
}

impl SmbConnectOptions {
    pub fn new(username: impl Into<String>, password: impl Into<String>, timeout: Duration) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            timeout,
            encrypt: true,
        }
    }

    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }
}

impl fmt::Debug for SmbConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmbConnectOptions")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("encrypt", &self.encrypt)
            .finish()
    }
}

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmbEntryKind {
    File,
    Directory,
    Other,
}

/// One entry returned by [`glob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmbDirEntry {
    pub name: String,
    /// Full UNC path of the entry.
    pub path: String,
    pub kind: SmbEntryKind,
}

impl SmbDirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == SmbEntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == SmbEntryKind::Directory
    }
}

/// What a path on the share turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmbListing {
    File(SmbDirEntry),
    Directory(Vec<SmbDirEntry>),
}

/// Seam to the SMB client library.
pub trait SmbBackend {
    /// Read the whole file at `path`.
    fn read_file(&self, path: &SmbPath, options: &SmbConnectOptions) -> std::result::Result<Vec<u8>, SmbError>;

    /// Describe `path`: the entry itself if it is a file, its children if
    /// it is a directory.
    fn scan(&self, path: &SmbPath, options: &SmbConnectOptions) -> std::result::Result<SmbListing, SmbError>;
}

/// A remote file opened for binary reading.
///
/// The content is fetched while the connection is open, so reading never
/// touches the network.
#[derive(Debug)]
pub struct SmbFile {
    path: SmbPath,
    content: Cursor<Vec<u8>>,
}

impl SmbFile {
    pub fn path(&self) -> &SmbPath {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.content.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.get_ref().is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_inner()
    }
}

impl Read for SmbFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.content.read(buf)
    }
}

/// Open the remote file at `path` (`\\server\share\file`) for reading.
pub fn open_file(backend: &dyn SmbBackend, path: &str, options: &SmbConnectOptions) -> Result<SmbFile> {
    let target = SmbPath::parse(path)?;
    info!("Opening {target} as {}", options.username);

    match backend.read_file(&target, options) {
        Ok(data) => Ok(SmbFile {
            path: target,
            content: Cursor::new(data),
        }),
        Err(SmbError::AuthFailed) => Err(ProbeError::LoginFailed),
        Err(SmbError::IsADirectory) => Err(ProbeError::TargetIsDirectory),
        Err(SmbError::NotFound) => Err(ProbeError::RemoteNotFound),
        Err(SmbError::Io { detail }) => Err(ProbeError::Io {
            reason: detail,
            path: path.to_string(),
        }),
        Err(SmbError::Unknown { detail }) => Err(ProbeError::Unknown {
            path: path.to_string(),
            detail,
        }),
    }
}

/// List the entries under `path` whose names match the shell-style
/// `pattern` (case-insensitive, `*` matches everything).
///
/// If `path` is a file, the result is that single file. A path that does
/// not exist yields an empty list.
pub fn glob(
    backend: &dyn SmbBackend,
    path: &str,
    pattern: &str,
    options: &SmbConnectOptions,
) -> Result<Vec<SmbDirEntry>> {
    let target = SmbPath::parse(path)?;
    let matcher = Pattern::new(pattern).map_err(|err| ProbeError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })?;
    info!("Listing {target} matching {pattern:?} as {}", options.username);

    match backend.scan(&target, options) {
        Ok(SmbListing::File(entry)) => Ok(vec![entry]),
        Ok(SmbListing::Directory(entries)) => Ok(entries
            .into_iter()
            .filter(|e| e.name != "." && e.name != "..")
            .filter(|e| matcher.matches_with(&e.name, match_options()))
            .collect()),
        Err(SmbError::NotFound) => {
            debug!("{target} does not exist, returning an empty listing");
            Ok(Vec::new())
        }
        Err(SmbError::AuthFailed) => Err(ProbeError::LoginFailed),
        Err(err @ SmbError::IsADirectory) => Err(ProbeError::Io {
            reason: err.to_string(),
            path: path.to_string(),
        }),
        Err(SmbError::Io { detail }) => Err(ProbeError::Io {
            reason: detail,
            path: path.to_string(),
        }),
        Err(SmbError::Unknown { detail }) => Err(ProbeError::Unknown {
            path: path.to_string(),
            detail,
        }),
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}
