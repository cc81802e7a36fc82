/// Platform-specific functionality — partition enumeration, temp-directory
/// resolution and the current working directory.

pub mod partitions;
pub mod tempdir;

pub use partitions::{filter_partitions, list_partitions, Partition};
pub use tempdir::{current_dir, temp_dir};
