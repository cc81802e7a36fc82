/// Temporary-directory resolution and the current working directory.
///
/// Candidates are tried in order and the first one the process can actually
/// create a file in wins:
///
/// 1. `TMPDIR`, `TEMP`, `TMP` environment variables.
/// 2. Platform defaults (`/tmp`, `/var/tmp`, `/usr/tmp` on Unix).
/// 3. The current working directory.
///
/// If none is writable, [`FALLBACK_TEMP_DIR`] is returned as is. A trailing
/// separator taken from an environment variable is kept.
use crate::error::{ProbeError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returned when no candidate directory is writable.
pub const FALLBACK_TEMP_DIR: &str = "/tmp";

/// Environment variables consulted, highest priority first.
pub const TEMP_ENV_VARS: [&str; 3] = ["TMPDIR", "TEMP", "TMP"];

/// Resolve a writable temporary directory.
pub fn temp_dir() -> PathBuf {
    let candidates = candidate_dirs(|key| std::env::var_os(key));
    first_writable(&candidates).unwrap_or_else(|| {
        warn!("No writable temp directory among {candidates:?}, using {FALLBACK_TEMP_DIR}");
        PathBuf::from(FALLBACK_TEMP_DIR)
    })
}

/// The process's current working directory.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|err| ProbeError::io(&err, "."))
}

/// Build the ordered candidate list, reading variables through `env`.
pub fn candidate_dirs(env: impl Fn(&str) -> Option<OsString>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = TEMP_ENV_VARS
        .iter()
        .filter_map(|&key| env(key))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect();

    dirs.extend(platform_defaults(&env));

    dirs.push(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    dirs
}

#[cfg(windows)]
fn platform_defaults(env: &impl Fn(&str) -> Option<OsString>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(profile) = env("USERPROFILE") {
        dirs.push(PathBuf::from(profile).join(r"AppData\Local\Temp"));
    }
    if let Some(system_root) = env("SYSTEMROOT") {
        dirs.push(PathBuf::from(system_root).join("Temp"));
    }
    dirs.extend([r"c:\temp", r"c:\tmp", r"\temp", r"\tmp"].map(PathBuf::from));
    dirs
}

#[cfg(not(windows))]
fn platform_defaults(_env: &impl Fn(&str) -> Option<OsString>) -> Vec<PathBuf> {
    ["/tmp", "/var/tmp", "/usr/tmp"].map(PathBuf::from).to_vec()
}

/// First candidate in which a scratch file can be created and removed.
pub fn first_writable(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find_map(|dir| {
        let dir = absolute(dir);
        match tempfile::Builder::new().prefix(".probekit-").tempfile_in(&dir) {
            Ok(_probe) => Some(dir),
            Err(err) => {
                debug!("Temp candidate {} not usable: {err}", dir.display());
                None
            }
        }
    })
}

fn absolute(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(dir),
        Err(_) => dir.to_path_buf(),
    }
}
