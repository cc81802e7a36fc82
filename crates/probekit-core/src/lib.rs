/// probekit core — helpers for monitoring check plugins.
///
/// Every operation is a stateless, blocking call returning
/// [`Result`]: the value on success, or a [`ProbeError`] whose `Display`
/// text is a diagnostic fit to print as a check's output.
///
/// # Modules
///
/// - [`scanner`] — Recursive file inventory with include/exclude patterns.
/// - [`grep`] — Extract a value from a file with a regular expression.
/// - [`platform`] — Partition listing, temp directory and working directory.
/// - [`smb`] — Open or list files on an SMB share.
/// - [`state`] — Monitoring exit codes.
pub mod error;
pub mod grep;
pub mod platform;
pub mod scanner;
pub mod smb;
pub mod state;

pub use error::{ProbeError, Result};
