//! Template loading and version resolution

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use artifactstore::{ArtifactStore, Version, is_enriched_artifact};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{LoadError, Template, relaxed};

/// Read, normalize and validate a template file
pub fn load_template(path: impl AsRef<Path>) -> Result<Template, LoadError> {
    let path = path.as_ref();
    debug!(?path, "load_template: called");

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
                root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            }
        } else {
            LoadError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    parse_template(path, &content)
}

/// Parse template text; `path` only labels errors
pub fn parse_template(path: &Path, content: &str) -> Result<Template, LoadError> {
    let value: Value = serde_json::from_str(&relaxed::normalize(content)).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    validate_shape(path, &value)?;

    let template: Template = serde_json::from_value(value).map_err(|e| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    template.version.parse::<Version>().map_err(|e| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(name = %template.name, version = %template.version, "parse_template: ok");
    Ok(template)
}

fn validate_shape(path: &Path, value: &Value) -> Result<(), LoadError> {
    let invalid = |reason: &str| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let root = value.as_object().ok_or_else(|| invalid("expected a JSON object"))?;
    match root.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err(invalid("missing required field 'name'")),
    }
    let prompts = root
        .get("prompts")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing required field 'prompts'"))?;
    if !prompts.get("default").is_some_and(Value::is_object) {
        return Err(invalid("'prompts' must expose a 'default' bundle"));
    }
    Ok(())
}

/// Decide which file to load for a template path
///
/// Enriched artifact paths are used as given. Otherwise the newest artifact
/// at or above the template's own version is preferred, falling back to the
/// template itself.
pub fn resolve_template_path(path: impl AsRef<Path>) -> Result<PathBuf, LoadError> {
    let path = path.as_ref();
    debug!(?path, "resolve_template_path: called");

    if is_enriched_artifact(path) {
        debug!("resolve_template_path: already an enriched artifact");
        return Ok(path.to_path_buf());
    }

    let template = load_template(path)?;
    let version: Version = template.version.parse().map_err(|e: artifactstore::ArtifactError| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let store = ArtifactStore::for_template(path).map_err(|source| LoadError::Artifact {
        path: path.to_path_buf(),
        source,
    })?;
    let latest = store.latest_since(&version).map_err(|source| LoadError::Artifact {
        path: path.to_path_buf(),
        source,
    })?;

    match latest {
        Some(artifact) => {
            info!(
                template = %path.display(),
                artifact = %artifact.path.display(),
                "Using enriched artifact"
            );
            Ok(artifact.path)
        }
        None => {
            warn!(
                template = %path.display(),
                dir = %store.version_dir(&version).display(),
                "No enriched artifact found, using base template"
            );
            Ok(path.to_path_buf())
        }
    }
}

/// Resolve then load, returning the path that was actually read
pub fn load_resolved(path: impl AsRef<Path>) -> Result<(PathBuf, Template), LoadError> {
    let resolved = resolve_template_path(path)?;
    let template = load_template(&resolved)?;
    Ok((resolved, template))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = r#"{
        // relaxed json is fine
        "name": "rust-specialist",
        "version": "0.0.1",
        "prompts": { "default": { "systemPrompt": "You are {{persona_role}}." }, },
    }"#;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn artifact(name: &str, version: &str) -> String {
        format!(
            r#"{{ "name": "{name}", "version": "{version}", "prompts": {{ "default": {{ "systemPrompt": "x" }} }} }}"#
        )
    }

    #[test]
    fn test_load_relaxed_template() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "rust.json", BASE);
        let t = load_template(&path).unwrap();
        assert_eq!(t.name, "rust-specialist");
        assert_eq!(t.prompts.default["systemPrompt"], "You are {{persona_role}}.");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_template(dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("project root"));
    }

    #[test]
    fn test_missing_name_names_path() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.json", r#"{ "prompts": { "default": {} } }"#);
        let err = load_template(&path).unwrap_err();
        assert!(matches!(err, LoadError::Invalid { .. }));
        assert!(err.to_string().contains("bad.json"));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_missing_prompts_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.json", r#"{ "name": "x" }"#);
        let err = load_template(&path).unwrap_err();
        assert!(err.to_string().contains("prompts"));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.json", "{ not json");
        assert!(matches!(load_template(&path).unwrap_err(), LoadError::Parse { .. }));
    }

    #[test]
    fn test_bad_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "v.json",
            r#"{ "name": "x", "version": "1.2", "prompts": { "default": {} } }"#,
        );
        assert!(matches!(load_template(&path).unwrap_err(), LoadError::Invalid { .. }));
    }

    #[test]
    fn test_resolve_without_artifacts_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "rust.json", BASE);
        assert_eq!(resolve_template_path(&path).unwrap(), path);
    }

    #[test]
    fn test_resolve_picks_highest_version_then_sequence() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "rust.json", BASE);
        write(
            dir.path(),
            "enriched/0.0.1/rust.enriched.001.json",
            &artifact("rust-specialist", "0.0.1"),
        );
        write(
            dir.path(),
            "enriched/0.0.1/rust.enriched.002.json",
            &artifact("rust-specialist", "0.0.1"),
        );
        let expected = write(
            dir.path(),
            "enriched/0.0.2/rust.enriched.001.json",
            &artifact("rust-specialist", "0.0.2"),
        );

        assert_eq!(resolve_template_path(&path).unwrap(), expected);
    }

    #[test]
    fn test_resolve_enriched_path_as_is() {
        let dir = TempDir::new().unwrap();
        let artifact_path = dir.path().join("enriched/0.0.2/rust.enriched.004.json");
        assert_eq!(resolve_template_path(&artifact_path).unwrap(), artifact_path);
    }

    #[test]
    fn test_load_resolved_reads_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "rust.json", BASE);
        write(
            dir.path(),
            "enriched/0.0.2/rust.enriched.001.json",
            &artifact("rust-specialist", "0.0.2"),
        );
        let (resolved, t) = load_resolved(&path).unwrap();
        assert!(resolved.ends_with("enriched/0.0.2/rust.enriched.001.json"));
        assert_eq!(t.version, "0.0.2");
    }
}
