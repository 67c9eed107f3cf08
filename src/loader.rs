//! Discovery and parsing of Terraform configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use hcl_edit::structure::Body;
use thiserror::Error;

/// Extension of configuration files picked up by the loader.
pub const CONFIG_EXTENSION: &str = "tf";

/// Terraform merges files ending in this suffix (or named `override.tf`) last, so the loader
/// never reads them back.
pub const OVERRIDE_SUFFIX: &str = "_override.tf";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not list {}: {source}", dir.display())]
    List {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("could not find any terraform files matching '*.tf' in {}", dir.display())]
    NoConfigurationFiles { dir: PathBuf },
}

/// What to do when a directory holds no configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPolicy {
    #[default]
    Error,
    Allow,
}

/// A parsed source file. Never modified after loading.
#[derive(Debug, Clone)]
pub struct ConfigurationDocument {
    pub path: PathBuf,
    pub body: Body,
}

impl ConfigurationDocument {
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self, LoadError> {
        let path = path.into();
        let body = hcl_edit::parser::parse_body(contents).map_err(|e| LoadError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { path, body })
    }
}

pub fn is_override_file(file_name: &str) -> bool {
    file_name == "override.tf" || file_name.ends_with(OVERRIDE_SUFFIX)
}

/// Lists `*.tf` files in `dir` in file-name order, skipping override files.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let pattern = format!(
        "{}/*.{CONFIG_EXTENSION}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&pattern).map_err(|source| LoadError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| LoadError::List {
            dir: dir.to_path_buf(),
            source: e.into_error(),
        })?;

        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_override_file(name) {
            tracing::debug!(file = name, "skipping override file");
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Reads and parses every configuration file in `dir`, stopping at the first failure.
pub fn load_documents(
    dir: &Path,
    policy: EmptyPolicy,
) -> Result<Vec<ConfigurationDocument>, LoadError> {
    let files = discover(dir)?;

    if files.is_empty() {
        match policy {
            EmptyPolicy::Error => {
                return Err(LoadError::NoConfigurationFiles {
                    dir: dir.to_path_buf(),
                });
            }
            EmptyPolicy::Allow => {
                tracing::info!(dir = %dir.display(), "no terraform files found, nothing to override");
                return Ok(Vec::new());
            }
        }
    }

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let contents = fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        documents.push(ConfigurationDocument::parse(path, &contents)?);
    }

    tracing::debug!(count = documents.len(), "terraform files loaded");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "variables.tf", "");
        write(&dir, "main.tf", "");
        write(&dir, "terraform_proxy_providers_override.tf", "");
        write(&dir, "override.tf", "");
        write(&dir, "README.md", "");
        write(&dir, "terraform.tfvars", "");
        fs::create_dir(dir.path().join("modules.tf")).unwrap();

        let files = discover(dir.path()).unwrap();
        assert_eq!(names(&files), vec!["main.tf", "variables.tf"]);
    }

    #[test]
    fn test_is_override_file() {
        assert!(is_override_file("override.tf"));
        assert!(is_override_file("providers_override.tf"));
        assert!(!is_override_file("main.tf"));
        assert!(!is_override_file("override_main.tf"));
    }

    #[test]
    fn test_load_documents_parses_blocks() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "main.tf", "provider \"aws\" {\n  region = \"eu-west-1\"\n}\n");

        let documents = load_documents(dir.path(), EmptyPolicy::Error).unwrap();
        assert_eq!(documents.len(), 1);

        let blocks: Vec<_> = documents[0]
            .body
            .iter()
            .filter_map(|s| s.as_block())
            .collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].ident.as_str(), "provider");
    }

    #[test]
    fn test_load_documents_fails_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.tf", "provider \"aws\" {}\n");
        write(&dir, "b.tf", "provider \"aws\" {\n");

        let err = load_documents(dir.path(), EmptyPolicy::Error).unwrap_err();
        match err {
            LoadError::Parse { path, .. } => assert!(path.ends_with("b.tf")),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_directory_is_error_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "terraform_proxy_providers_override.tf", "");

        let err = load_documents(dir.path(), EmptyPolicy::default()).unwrap_err();
        assert!(matches!(err, LoadError::NoConfigurationFiles { .. }));
        assert!(err.to_string().contains("could not find any terraform files"));
    }

    #[test]
    fn test_empty_directory_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let documents = load_documents(dir.path(), EmptyPolicy::Allow).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn test_missing_directory_has_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(discover(&missing).unwrap().is_empty());

        let err = load_documents(&missing, EmptyPolicy::Error).unwrap_err();
        assert!(matches!(err, LoadError::NoConfigurationFiles { .. }));
    }

    #[test]
    fn test_discover_escapes_directory_name() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("env-[prod]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("main.tf"), "").unwrap();

        let files = discover(&dir).unwrap();
        assert_eq!(names(&files), vec!["main.tf"]);
    }
}
