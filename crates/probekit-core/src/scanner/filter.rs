/// Include/exclude path filtering for the directory scanner.
///
/// Both patterns are compiled once, case-insensitively, and only ever
/// matched against the *start* of the full path: a pattern that would
/// only match somewhere in the middle of the path does not count.
use crate::error::{ProbeError, Result};
use regex::{Regex, RegexBuilder};

/// Outcome of running a path through a [`PathFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    /// Matched the exclude pattern.
    Excluded,
    /// Did not match the include pattern.
    NotIncluded,
}

/// Compiled include/exclude pair.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude: Option<Regex>,
    include: Option<Regex>,
}

impl PathFilter {
    /// Compile both patterns. Empty patterns are treated as absent.
    pub fn new(exclude: Option<&str>, include: Option<&str>) -> Result<Self> {
        Ok(Self {
            exclude: compile("exclude", exclude)?,
            include: compile("include", include)?,
        })
    }

    /// Decide whether `full_path` is kept. Exclusion is checked first,
    /// so a path matching both patterns is dropped.
    pub fn check(&self, full_path: &str) -> Verdict {
        if let Some(re) = &self.exclude {
            if matches_at_start(re, full_path) {
                return Verdict::Excluded;
            }
        }
        if let Some(re) = &self.include {
            if !matches_at_start(re, full_path) {
                return Verdict::NotIncluded;
            }
        }
        Verdict::Keep
    }

    pub fn is_empty(&self) -> bool {
        self.exclude.is_none() && self.include.is_none()
    }
}

fn compile(kind: &'static str, pattern: Option<&str>) -> Result<Option<Regex>> {
    let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| ProbeError::InvalidPattern {
            kind,
            pattern: pattern.to_string(),
            source,
        })
}

/// Leftmost-first search returns the earliest starting match, so a match
/// anchored at 0 exists iff the first match found starts at 0.
fn matches_at_start(re: &Regex, haystack: &str) -> bool {
    re.find(haystack).is_some_and(|m| m.start() == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = PathFilter::new(None, None).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.check("/data/anything.bin"), Verdict::Keep);
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let filter = PathFilter::new(Some(""), Some("")).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.check("/data/a.txt"), Verdict::Keep);
    }

    #[test]
    fn match_is_anchored_at_start() {
        // "txt" occurs in the path but not at position 0.
        let filter = PathFilter::new(None, Some("txt")).unwrap();
        assert_eq!(filter.check("/data/a.txt"), Verdict::NotIncluded);

        let filter = PathFilter::new(None, Some(r".*\.txt$")).unwrap();
        assert_eq!(filter.check("/data/a.txt"), Verdict::Keep);
    }

    #[test]
    fn anchored_match_is_not_full_match() {
        // Only the start is anchored; trailing text is allowed.
        let filter = PathFilter::new(Some("/data/sub"), None).unwrap();
        assert_eq!(filter.check("/data/sub/c.txt"), Verdict::Excluded);
        assert_eq!(filter.check("/data/a.txt"), Verdict::Keep);
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = PathFilter::new(Some(r".*secret"), Some(r".*\.txt$")).unwrap();
        assert_eq!(filter.check("/data/secret.txt"), Verdict::Excluded);
        assert_eq!(filter.check("/data/public.txt"), Verdict::Keep);
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let filter = PathFilter::new(Some(r".*\.LOG$"), None).unwrap();
        assert_eq!(filter.check("/var/app.log"), Verdict::Excluded);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PathFilter::new(None, Some("(unclosed")).unwrap_err();
        match err {
            ProbeError::InvalidPattern { kind, pattern, .. } => {
                assert_eq!(kind, "include");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
