//! Service states as understood by Nagios-compatible monitoring systems.
//!
//! A check plugin reports its result through the process exit code.

pub const STATE_OK: i32 = 0;
pub const STATE_WARN: i32 = 1;
pub const STATE_CRIT: i32 = 2;
/// The check itself could not run.
pub const STATE_UNKNOWN: i32 = 3;
