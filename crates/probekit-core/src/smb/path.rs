//! UNC path handling for SMB targets.

use crate::error::{ProbeError, Result};
use std::fmt;

/// A parsed `\\server\share\dir\file` path.
///
/// Forward slashes are accepted on input. The in-share part is kept in
/// `/`-separated form with a leading slash, which is what SMB client
/// libraries expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbPath {
    server: String,
    share: String,
    components: Vec<String>,
}

impl SmbPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.replace('/', "\\");
        let rest = normalized
            .strip_prefix("\\\\")
            .ok_or_else(|| ProbeError::InvalidSmbPath(raw.to_string()))?;

        let mut parts = rest.split('\\').filter(|p| !p.is_empty());
        let (Some(server), Some(share)) = (parts.next(), parts.next()) else {
            return Err(ProbeError::InvalidSmbPath(raw.to_string()));
        };

        Ok(Self {
            server: server.to_string(),
            share: share.to_string(),
            components: parts.map(str::to_string).collect(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn share(&self) -> &str {
        &self.share
    }

    /// Path inside the share, e.g. `/logs/app.log`; `/` for the share root.
    pub fn path(&self) -> String {
        format!("/{}", self.components.join("/"))
    }

    /// Last component, or the share name for the share root.
    pub fn file_name(&self) -> &str {
        self.components.last().unwrap_or(&self.share)
    }

    pub fn join(&self, name: &str) -> Self {
        let mut joined = self.clone();
        joined
            .components
            .extend(name.split(['\\', '/']).filter(|p| !p.is_empty()).map(str::to_string));
        joined
    }
}

impl fmt::Display for SmbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\\\{}\\{}", self.server, self.share)?;
        for component in &self.components {
            write!(f, "\\{component}")?;
        }
        Ok(())
    }
}
