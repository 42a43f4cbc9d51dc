//! Semantic version used to name artifact directories

use std::fmt;
use std::str::FromStr;

use crate::ArtifactError;

/// A `MAJOR.MINOR.PATCH` version
///
/// Ordering is numeric per component, so `0.0.10` sorts after `0.0.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// The next patch release
    pub fn bump_patch(&self) -> Self {
        Self {
            patch: self.patch + 1,
            ..*self
        }
    }
}

impl FromStr for Version {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(ArtifactError::InvalidVersion(s.to_string()));
        }

        let parse = |p: &str| p.parse::<u64>().map_err(|_| ArtifactError::InvalidVersion(s.to_string()));
        Ok(Self {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
