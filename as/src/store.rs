//! Core ArtifactStore implementation

use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::{ArtifactError, MAX_WRITE_ATTEMPTS, SEQUENCE_WIDTH, Version};

/// Name of the directory holding enriched artifacts, next to the template
pub const ENRICHED_DIR: &str = "enriched";

static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+)\.enriched\.(?P<seq>\d{3,})\.json$").expect("artifact name regex is valid")
});

/// Split an artifact file name into its base name and sequence number
pub fn parse_artifact_name(file_name: &str) -> Option<(String, u32)> {
    let caps = ARTIFACT_NAME.captures(file_name)?;
    let seq = caps["seq"].parse::<u32>().ok()?;
    Some((caps["base"].to_string(), seq))
}

/// Does this path follow the enriched artifact naming convention?
pub fn is_enriched_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| parse_artifact_name(n).is_some())
        .unwrap_or(false)
}

/// One artifact on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub version: Version,
    pub sequence: u32,
    pub path: PathBuf,
}

/// Append-only artifact directory for a single template
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Directory containing the base template
    template_dir: PathBuf,
    /// Template file stem, shared by every artifact name
    base_name: String,
}

impl ArtifactStore {
    /// Open the store belonging to a template
    ///
    /// Accepts either the base template path or the path of one of its
    /// enriched artifacts; both map to the same store.
    pub fn for_template(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArtifactError::InvalidPath(path.to_path_buf()))?;

        if let Some((base_name, _)) = parse_artifact_name(file_name) {
            // {template_dir}/enriched/{version}/{file}
            let template_dir = path
                .parent()
                .and_then(Path::parent)
                .and_then(Path::parent)
                .ok_or_else(|| ArtifactError::InvalidPath(path.to_path_buf()))?;
            debug!(?template_dir, %base_name, "for_template: enriched artifact path");
            return Ok(Self {
                template_dir: normalize_dir(template_dir),
                base_name,
            });
        }

        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ArtifactError::InvalidPath(path.to_path_buf()))?
            .to_string();
        let template_dir = path.parent().map(normalize_dir).unwrap_or_else(|| PathBuf::from("."));
        debug!(?template_dir, %base_name, "for_template: base template path");

        Ok(Self {
            template_dir,
            base_name,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// `{template_dir}/enriched`
    pub fn root(&self) -> PathBuf {
        self.template_dir.join(ENRICHED_DIR)
    }

    /// `{template_dir}/enriched/{version}`
    pub fn version_dir(&self, version: &Version) -> PathBuf {
        self.root().join(version.to_string())
    }

    /// Path an artifact with this version and sequence would occupy
    pub fn artifact_path(&self, version: &Version, sequence: u32) -> PathBuf {
        self.version_dir(version).join(format!(
            "{}.enriched.{:0width$}.json",
            self.base_name,
            sequence,
            width = SEQUENCE_WIDTH
        ))
    }

    /// All version directories, ascending
    ///
    /// Directories whose names are not versions are ignored.
    pub fn versions(&self) -> Result<Vec<Version>, ArtifactError> {
        let root = self.root();
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?root, "versions: no enriched directory");
                return Ok(Vec::new());
            }
            Err(e) => return Err(ArtifactError::io(&root, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(&root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match name.parse::<Version>() {
                Ok(v) => versions.push(v),
                Err(_) => debug!(%name, "versions: skipping non-version directory"),
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Artifacts of this template inside one version directory, by ascending sequence
    pub fn artifacts_in(&self, version: &Version) -> Result<Vec<ArtifactRef>, ArtifactError> {
        let dir = self.version_dir(version);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArtifactError::io(&dir, e)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match parse_artifact_name(name) {
                Some((base, sequence)) if base == self.base_name => artifacts.push(ArtifactRef {
                    version: *version,
                    sequence,
                    path,
                }),
                _ => {}
            }
        }

        artifacts.sort_by_key(|a| a.sequence);
        Ok(artifacts)
    }

    /// Every artifact, ordered by version then sequence
    pub fn list(&self) -> Result<Vec<ArtifactRef>, ArtifactError> {
        let mut all = Vec::new();
        for version in self.versions()? {
            all.extend(self.artifacts_in(&version)?);
        }
        Ok(all)
    }

    /// Highest sequence in the highest version directory that holds any artifact
    ///
    /// Always read from disk; other processes may have written newer artifacts.
    pub fn latest(&self) -> Result<Option<ArtifactRef>, ArtifactError> {
        self.latest_since(&Version::default())
    }

    /// Like [`ArtifactStore::latest`], ignoring version directories below `min`
    pub fn latest_since(&self, min: &Version) -> Result<Option<ArtifactRef>, ArtifactError> {
        for version in self.versions()?.iter().rev().filter(|v| *v >= min) {
            if let Some(latest) = self.artifacts_in(version)?.pop() {
                debug!(path = ?latest.path, "latest: found");
                return Ok(Some(latest));
            }
            debug!(%version, "latest: version directory empty, checking older");
        }
        Ok(None)
    }

    /// Next unused sequence number in a version directory (1 when empty)
    pub fn next_sequence(&self, version: &Version) -> Result<u32, ArtifactError> {
        Ok(self.artifacts_in(version)?.last().map(|a| a.sequence + 1).unwrap_or(1))
    }

    /// Write a new artifact without ever replacing an existing file
    ///
    /// Creates the version directory on demand. If another writer claims the
    /// computed sequence first, the next one is tried.
    pub fn write_new(&self, version: &Version, contents: &[u8]) -> Result<ArtifactRef, ArtifactError> {
        self.write_next(version, |_| contents.to_vec())
    }

    /// Like [`ArtifactStore::write_new`], rendering the contents for the sequence actually claimed
    pub fn write_next<F>(&self, version: &Version, mut render: F) -> Result<ArtifactRef, ArtifactError>
    where
        F: FnMut(u32) -> Vec<u8>,
    {
        let dir = self.version_dir(version);
        fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

        let mut sequence = self.next_sequence(version)?;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let path = self.artifact_path(version, sequence);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&render(sequence)).map_err(|e| ArtifactError::io(&path, e))?;
                    info!(path = %path.display(), %version, sequence, "Wrote artifact");
                    return Ok(ArtifactRef {
                        version: *version,
                        sequence,
                        path,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(?path, "write_next: sequence taken, advancing");
                    sequence += 1;
                }
                Err(e) => return Err(ArtifactError::io(&path, e)),
            }
        }

        Err(ArtifactError::SequenceExhausted {
            dir,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

fn normalize_dir(dir: &Path) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    }
}
