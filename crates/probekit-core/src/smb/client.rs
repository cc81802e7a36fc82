/// libsmbclient-backed [`SmbBackend`] built on `pavao`.
///
/// Each call resolves the server, checks that TCP port 445 answers within the
/// caller's timeout, then opens a fresh client. The client is dropped (and
/// the session closed) before the call returns.
use super::{SmbBackend, SmbConnectOptions, SmbDirEntry, SmbEntryKind, SmbError, SmbListing, SmbPath};
use crate::error::os_reason;
use pavao::{
    SmbClient, SmbCredentials, SmbDirentType, SmbEncryptionLevel, SmbError as ClientError,
    SmbOpenOptions, SmbOptions,
};
use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

const SMB_PORT: u16 = 445;

#[derive(Debug, Clone, Default)]
pub struct PavaoBackend {
    /// NetBIOS workgroup / domain, if the server requires one.
    pub workgroup: Option<String>,
}

impl PavaoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workgroup(workgroup: impl Into<String>) -> Self {
        Self {
            workgroup: Some(workgroup.into()),
        }
    }

    fn connect(&self, path: &SmbPath, options: &SmbConnectOptions) -> Result<SmbClient, SmbError> {
        probe_port(path.server(), options.timeout)?;

        let mut credentials = SmbCredentials::default()
            .server(format!("smb://{}", path.server()))
            .share(format!("/{}", path.share()))
            .username(options.username.as_str())
            .password(options.password.as_str());
        if let Some(workgroup) = &self.workgroup {
            credentials = credentials.workgroup(workgroup.as_str());
        }

        let encryption = if options.encrypt {
            SmbEncryptionLevel::Require
        } else {
            SmbEncryptionLevel::None
        };
        let client_options = SmbOptions::default()
            .one_share_per_server(true)
            .no_auto_anonymous_login(true)
            .encryption_level(encryption);

        SmbClient::new(credentials, client_options).map_err(translate)
    }
}

impl SmbBackend for PavaoBackend {
    fn read_file(&self, path: &SmbPath, options: &SmbConnectOptions) -> Result<Vec<u8>, SmbError> {
        let client = self.connect(path, options)?;
        let mut file = client
            .open_with(&path.path(), SmbOpenOptions::default().read(true))
            .map_err(translate)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|err| from_io(&err))?;
        debug!("Read {} bytes from {path}", data.len());
        Ok(data)
    }

    fn scan(&self, path: &SmbPath, options: &SmbConnectOptions) -> Result<SmbListing, SmbError> {
        let client = self.connect(path, options)?;
        match client.list_dir(&path.path()) {
            Ok(dirents) => Ok(SmbListing::Directory(
                dirents
                    .iter()
                    .map(|dirent| SmbDirEntry {
                        name: dirent.name().to_string(),
                        path: path.join(dirent.name()).to_string(),
                        kind: match dirent.get_type() {
                            SmbDirentType::File => SmbEntryKind::File,
                            SmbDirentType::Dir => SmbEntryKind::Directory,
                            _ => SmbEntryKind::Other,
                        },
                    })
                    .collect(),
            )),
            // Listing a file fails with ENOTDIR, which also proves it exists.
            Err(ClientError::Io(err)) if err.raw_os_error() == Some(libc::ENOTDIR) => {
                Ok(SmbListing::File(SmbDirEntry {
                    name: path.file_name().to_string(),
                    path: path.to_string(),
                    kind: SmbEntryKind::File,
                }))
            }
            Err(err) => Err(translate(err)),
        }
    }
}

/// Fail fast, within `timeout`, when nothing listens on the SMB port.
fn probe_port(server: &str, timeout: Duration) -> Result<(), SmbError> {
    let addrs = (server, SMB_PORT).to_socket_addrs().map_err(|err| SmbError::Io {
        detail: os_reason(&err),
    })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(err) => last_err = Some(err),
        }
    }
    Err(match last_err {
        Some(err) => from_io(&err),
        None => SmbError::Io {
            detail: format!("{server} did not resolve to any address"),
        },
    })
}

fn translate(err: ClientError) -> SmbError {
    match err {
        ClientError::Io(io) => from_io(&io),
        other => SmbError::Unknown {
            detail: other.to_string(),
        },
    }
}

fn from_io(err: &std::io::Error) -> SmbError {
    match err.raw_os_error() {
        Some(libc::EACCES) | Some(libc::EPERM) => SmbError::AuthFailed,
        Some(libc::ENOENT) => SmbError::NotFound,
        Some(libc::EISDIR) => SmbError::IsADirectory,
        _ if err.kind() == ErrorKind::TimedOut => SmbError::Io {
            detail: "Connection timed out".to_string(),
        },
        _ => SmbError::Io {
            detail: os_reason(err),
        },
    }
}
