//! Spec file discovery
//!
//! Recursively enumerates spec files beneath the suite's spec directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::SpecFile;

/// Spec file extensions considered part of the suite
const SPEC_EXTENSIONS: &[&str] = &["js", "ts"];

/// Discovers spec files for a run.
///
/// Spec identifiers are paths relative to the suite directory, which is
/// what the remote session expects in its capabilities.
pub struct SpecDiscovery {
    /// Suite directory (the directory that gets archived)
    suite_dir: PathBuf,

    /// Spec directory beneath the suite directory
    specs_dir: String,
}

impl SpecDiscovery {
    pub fn new(suite_dir: impl Into<PathBuf>, specs_dir: impl Into<String>) -> Self {
        Self {
            suite_dir: suite_dir.into(),
            specs_dir: specs_dir.into(),
        }
    }

    /// Directory that is scanned for spec files
    pub fn spec_root(&self) -> PathBuf {
        self.suite_dir.join(&self.specs_dir)
    }

    /// Enumerate all spec files, identified relative to the suite directory.
    ///
    /// The returned order is directory order, stable for a given tree.
    pub fn discover(&self) -> Result<Vec<SpecFile>> {
        let root = self.spec_root();
        if !root.exists() {
            anyhow::bail!(
                "Spec directory {} does not exist; check the suite path and spec directory settings",
                root.display()
            );
        }

        let mut files = Vec::new();
        collect_specs(&root, &mut files)
            .with_context(|| format!("Failed to scan spec directory {}", root.display()))?;
        files.sort();

        let specs: Vec<SpecFile> = files
            .iter()
            .map(|path| SpecFile::relative_to(&self.suite_dir, path))
            .collect();

        debug!("Discovered {} spec files under {}", specs.len(), root.display());
        Ok(specs)
    }
}

/// Recursively collect spec files into `out`
fn collect_specs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            collect_specs(&path, out)?;
        } else if is_spec_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Check whether a file has a spec extension
fn is_spec_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPEC_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_discover_nested_specs() {
        let dir = tempdir().unwrap();
        let suite = dir.path().join("cypress");
        touch(&suite.join("integration/login.spec.js"));
        touch(&suite.join("integration/checkout/cart.spec.js"));
        touch(&suite.join("integration/README.md"));
        touch(&suite.join("fixtures/users.json"));

        let discovery = SpecDiscovery::new(&suite, "integration");
        let specs = discovery.discover().unwrap();

        let paths: Vec<&str> = specs.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "integration/checkout/cart.spec.js",
                "integration/login.spec.js",
            ]
        );
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempdir().unwrap();
        let discovery = SpecDiscovery::new(dir.path(), "integration");
        assert!(discovery.discover().is_err());
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("integration")).unwrap();

        let discovery = SpecDiscovery::new(dir.path(), "integration");
        let specs = discovery.discover().unwrap();
        assert!(specs.is_empty());
    }
}
