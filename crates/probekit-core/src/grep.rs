//! `grep`-like extraction of a single value from a file.

use crate::error::{ProbeError, Result};
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Search `path` for the first match of `pattern` and return its first
/// capture group.
///
/// The whole file is read into memory. If the pattern matches but group 1
/// did not take part in the match, the result is an empty string.
///
/// ```no_run
/// let version = probekit_core::grep::grep_file("version.php", r"\$OC_Version = array\((.*)\)")?;
/// # Ok::<(), probekit_core::ProbeError>(())
/// ```
pub fn grep_file(path: impl AsRef<Path>, pattern: &str) -> Result<String> {
    let path = path.as_ref();
    let shown = path.to_string_lossy();

    let re = Regex::new(pattern).map_err(|source| ProbeError::InvalidPattern {
        kind: "grep",
        pattern: pattern.to_string(),
        source,
    })?;
    if re.captures_len() < 2 {
        // Without a group there is nothing to return; reject up front.
        return Err(ProbeError::Unknown {
            path: shown.into_owned(),
            detail: format!("pattern {pattern:?} has no capture group"),
        });
    }

    let data = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        // Not valid UTF-8 text.
        ErrorKind::InvalidData => ProbeError::Unreadable(shown.to_string()),
        _ => ProbeError::io(&err, shown.as_ref()),
    })?;

    let caps = re.captures(&data).ok_or_else(|| {
        debug!("{shown}: no match for {pattern:?}");
        ProbeError::NoMatch
    })?;
    Ok(caps.get(1).map_or_else(String::new, |m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[test]
    fn returns_first_capture_group() {
        let f = file_with(b"name=demo\nversion=42\nversion=43\n");
        assert_eq!(grep_file(f.path(), r"version=(\d+)").unwrap(), "42");
    }

    #[test]
    fn nextcloud_style_version_line() {
        let f = file_with(b"<?php\n$OC_Version = array(25,0,2,3);\n");
        let got = grep_file(f.path(), r"\$OC_Version = array\((.*)\)").unwrap();
        assert_eq!(got, "25,0,2,3");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope.txt");
        let err = grep_file(&missing, r"(x)").unwrap_err();
        assert!(matches!(err, ProbeError::Io { .. }));
        assert!(err.to_string().contains("I/O error"), "got {err}");
    }

    #[test]
    fn no_match_is_a_clean_error() {
        let f = file_with(b"nothing to see\n");
        let err = grep_file(f.path(), r"version=(\d+)").unwrap_err();
        assert!(matches!(err, ProbeError::NoMatch));
        assert_eq!(err.to_string(), "no match");
    }

    #[test]
    fn binary_content_is_an_unknown_read_error() {
        let f = file_with(&[0xff, 0xfe, 0x00, 0xc3]);
        let err = grep_file(f.path(), r"(.)").unwrap_err();
        assert!(matches!(err, ProbeError::Unreadable(_)));
        assert!(err.to_string().starts_with("Unknown error opening or reading"));
    }

    #[test]
    fn optional_group_that_did_not_participate_is_empty() {
        let f = file_with(b"key=\n");
        assert_eq!(grep_file(f.path(), r"key=(\d+)?").unwrap(), "");
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let f = file_with(b"version=42\n");
        assert!(grep_file(f.path(), r"version=\d+").is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let f = file_with(b"x\n");
        assert!(matches!(
            grep_file(f.path(), "(["),
            Err(ProbeError::InvalidPattern { .. })
        ));
    }
}
