//! Suite packaging
//!
//! Zips the suite directory and its config file into a temp archive
//! ready for upload.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Directory within the project root that holds the suite
pub const SUITE_DIR_NAME: &str = "cypress";

/// Suite configuration file at the project root
pub const SUITE_CONFIG_FILE: &str = "cypress.json";

/// Packages a suite directory into a zip archive.
pub struct SuiteArchiver {
    /// Project root containing the suite directory and config file
    project_root: PathBuf,
}

impl SuiteArchiver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Suite directory beneath the project root
    pub fn suite_dir(&self) -> PathBuf {
        self.project_root.join(SUITE_DIR_NAME)
    }

    /// Create the archive in a temp file.
    ///
    /// The returned handle keeps the file alive; it is deleted when
    /// dropped, after the upload has consumed it.
    pub fn archive(&self) -> Result<NamedTempFile> {
        let suite_dir = self.suite_dir();
        if !suite_dir.is_dir() {
            anyhow::bail!(
                "Suite directory {} does not exist; check the path setting",
                suite_dir.display()
            );
        }

        let archive = NamedTempFile::new().context("Failed to create temp archive")?;
        let mut writer = ZipWriter::new(
            archive
                .reopen()
                .context("Failed to open temp archive for writing")?,
        );
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        self.add_dir(&mut writer, &suite_dir, SUITE_DIR_NAME, options)?;

        let config_path = self.project_root.join(SUITE_CONFIG_FILE);
        if config_path.is_file() {
            add_file(&mut writer, &config_path, SUITE_CONFIG_FILE, options)?;
        } else {
            warn!(
                "Suite config {} not found; archiving without it",
                config_path.display()
            );
        }

        writer.finish().context("Failed to finalize archive")?;
        debug!("Created suite archive at {}", archive.path().display());
        Ok(archive)
    }

    /// Recursively add a directory under the given archive prefix
    fn add_dir(
        &self,
        writer: &mut ZipWriter<File>,
        dir: &Path,
        prefix: &str,
        options: SimpleFileOptions,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .collect::<io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let name = format!("{prefix}/{}", entry.file_name().to_string_lossy());

            if entry.file_type()?.is_dir() {
                self.add_dir(writer, &path, &name, options)?;
            } else {
                add_file(writer, &path, &name, options)?;
            }
        }
        Ok(())
    }
}

/// Add one file to the archive under the given entry name
fn add_file(
    writer: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    writer
        .start_file(name, options)
        .with_context(|| format!("Failed to add {name} to archive"))?;
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    io::copy(&mut file, writer).with_context(|| format!("Failed to write {name} to archive"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_archive_contains_suite_and_config() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("cypress/integration/a.spec.js"), "it()");
        write(&dir.path().join("cypress/fixtures/user.json"), "{}");
        write(&dir.path().join("cypress.json"), "{\"baseUrl\":\"/\"}");

        let archiver = SuiteArchiver::new(dir.path());
        let archive = archiver.archive().unwrap();

        let mut zip = zip::ZipArchive::new(File::open(archive.path()).unwrap()).unwrap();
        let names: HashSet<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();

        assert!(names.contains("cypress/integration/a.spec.js"));
        assert!(names.contains("cypress/fixtures/user.json"));
        assert!(names.contains("cypress.json"));
    }

    #[test]
    fn test_archive_without_config_file() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("cypress/integration/a.spec.js"), "it()");

        let archiver = SuiteArchiver::new(dir.path());
        let archive = archiver.archive().unwrap();

        let zip = zip::ZipArchive::new(File::open(archive.path()).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
    }

    #[test]
    fn test_archive_missing_suite_dir() {
        let dir = tempdir().unwrap();
        let archiver = SuiteArchiver::new(dir.path());
        assert!(archiver.archive().is_err());
    }
}
