/// Scanner module — recursive file inventory of a directory tree.
///
/// Walks the tree under a root with `jwalk` (serial mode, so entries come
/// back in the order the OS reports them) and emits every non-directory
/// entry that survives the include/exclude [`filter::PathFilter`].
///
/// Two entry points:
/// - [`walk`] / [`walk_with`] materialise the whole inventory in a `Vec`.
/// - [`Walker`] yields the same paths lazily, one at a time. It is finite
///   and cannot be restarted.
///
/// # Symlinks
///
/// Links are not followed by default, and a link to a directory is neither
/// descended into nor emitted. With [`WalkOptions::follow_links`] enabled,
/// `jwalk` tracks the directories above each followed link and reports a
/// link that points back at one of them as an error. That link is skipped
/// with a `debug!` line and the rest of the walk carries on.
///
/// # Non-UTF-8 names
///
/// Paths are returned as `String`. An entry whose path is not valid UTF-8
/// cannot be represented without changing it, so it is skipped with a
/// `warn!`. A root that is not valid UTF-8 is rejected up front.
pub mod filter;

use crate::error::{ProbeError, Result};
use filter::{PathFilter, Verdict};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

type EntryIter = Box<dyn Iterator<Item = std::result::Result<jwalk::DirEntry<((), ())>, jwalk::Error>>>;

/// Parameters for one directory walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory to walk.
    pub root: PathBuf,
    /// Skip files whose full path matches this pattern at its start.
    pub exclude: Option<String>,
    /// Keep only files whose full path matches this pattern at its start.
    pub include: Option<String>,
    /// Emit paths relative to `root` (default) instead of full paths.
    pub relative: bool,
    /// Follow symbolic links while descending.
    pub follow_links: bool,
}

impl WalkOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: None,
            include: None,
            relative: true,
            follow_links: false,
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include = Some(pattern.into());
        self
    }

    pub fn relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// Recursively list the files under `root`.
///
/// ```no_run
/// let files = probekit_core::scanner::walk("/tmp", Some(".*Temp-.*"), None, false)?;
/// # Ok::<(), probekit_core::ProbeError>(())
/// ```
pub fn walk(
    root: impl AsRef<Path>,
    exclude: Option<&str>,
    include: Option<&str>,
    relative: bool,
) -> Result<Vec<String>> {
    let mut options = WalkOptions::new(root.as_ref()).relative(relative);
    options.exclude = exclude.map(str::to_string);
    options.include = include.map(str::to_string);
    walk_with(&options)
}

/// Recursively list the files described by `options`.
pub fn walk_with(options: &WalkOptions) -> Result<Vec<String>> {
    let start = Instant::now();
    let files: Vec<String> = Walker::new(options)?.collect();
    debug!(
        "Walk of {} complete: {} files in {:?}",
        options.root.display(),
        files.len(),
        start.elapsed()
    );
    Ok(files)
}

/// Lazy directory walk. Created by [`Walker::new`].
pub struct Walker {
    /// Root as given, with a trailing separator appended.
    root: String,
    root_path: PathBuf,
    filter: PathFilter,
    relative: bool,
    entries: EntryIter,
}

impl Walker {
    /// Validate the root and compile the patterns. Nothing is read from the
    /// tree until the first call to `next`.
    pub fn new(options: &WalkOptions) -> Result<Self> {
        let filter = PathFilter::new(options.exclude.as_deref(), options.include.as_deref())?;
        check_root(&options.root)?;

        let root = with_trailing_separator(&options.root)?;
        let root_path = options.root.clone();
        info!("Walking {root}");

        let entries = jwalk::WalkDir::new(&root_path)
            .skip_hidden(false)
            .sort(false)
            .follow_links(options.follow_links)
            .parallelism(jwalk::Parallelism::Serial)
            .into_iter();

        Ok(Self {
            root,
            root_path,
            filter,
            relative: options.relative,
            entries: Box::new(entries.fuse()),
        })
    }

    /// The root with its trailing separator, as used for prefix stripping.
    pub fn root(&self) -> &str {
        &self.root
    }
}

impl Iterator for Walker {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for entry_result in self.entries.by_ref() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    // Unreadable directories and link cycles are skipped, not fatal.
                    debug!("Skipping entry: {err}");
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                continue;
            }

            let Ok(rel) = path.strip_prefix(&self.root_path) else {
                continue;
            };
            let Some(rel) = rel.to_str() else {
                warn!("Skipping {}: name is not valid UTF-8", path.display());
                continue;
            };
            let full = format!("{}{}", self.root, rel);

            if !self.filter.is_empty() {
                match self.filter.check(&full) {
                    Verdict::Keep => {}
                    verdict => {
                        debug!("{full}: {verdict:?}");
                        continue;
                    }
                }
            }

            return Some(if self.relative { rel.to_string() } else { full });
        }
        None
    }
}

fn check_root(root: &Path) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ProbeError::NotADirectory(root.to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ProbeError::NotFound(root.to_path_buf()))
        }
        Err(err) => Err(ProbeError::io(&err, root.to_string_lossy())),
    }
}

/// `/tmp` becomes `/tmp/`, so stripping it can never eat part of `/tmp2`.
fn with_trailing_separator(root: &Path) -> Result<String> {
    let mut s = root
        .to_str()
        .ok_or_else(|| ProbeError::NonUnicodePath(root.to_path_buf()))?
        .to_string();
    if !s.ends_with(std::path::is_separator) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_separator_is_appended_once() {
        let sep = std::path::MAIN_SEPARATOR;
        let with = |p: &str| with_trailing_separator(Path::new(p)).unwrap();
        assert_eq!(with("/tmp"), format!("/tmp{sep}"));
        assert_eq!(with("/tmp/"), "/tmp/");
        assert_eq!(with("/"), "/");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_root_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new(OsStr::from_bytes(b"/tmp/bad\xffroot"));
        assert!(matches!(
            with_trailing_separator(root),
            Err(ProbeError::NonUnicodePath(_))
        ));
    }

    #[test]
    fn options_default_to_relative_without_links() {
        let opts = WalkOptions::new("/data");
        assert!(opts.relative);
        assert!(!opts.follow_links);
        assert!(opts.exclude.is_none() && opts.include.is_none());
    }

    #[test]
    fn invalid_pattern_fails_before_root_check() {
        let opts = WalkOptions::new("/definitely/not/here").include("[");
        assert!(matches!(
            Walker::new(&opts),
            Err(ProbeError::InvalidPattern { .. })
        ));
    }
}
