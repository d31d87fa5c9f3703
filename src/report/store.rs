//! Raw report storage
//!
//! Persists per-session report documents keyed by session id. Each file
//! is written exactly once by the session's cleanup task, so there is
//! no contention on individual files; only the merge step lists the
//! directory, strictly after all writers have finished.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filename of the consolidated report
const MERGED_REPORT_FILE: &str = "report.json";

/// Storage for per-session raw reports and the merged report
#[derive(Clone, Debug)]
pub struct ReportStore {
    /// Directory holding per-session report files
    base_dir: PathBuf,
}

impl ReportStore {
    /// Create a store over the given directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with the default directory
    pub fn default_dir() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grid-runner")
            .join("reports");
        Ok(Self::new(base_dir))
    }

    /// Directory holding the per-session reports
    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the consolidated report, next to the per-session files
    pub fn merged_path(&self) -> PathBuf {
        match self.base_dir.parent() {
            Some(parent) if parent.as_os_str() != "" => parent.join(MERGED_REPORT_FILE),
            _ => self.base_dir.join(MERGED_REPORT_FILE),
        }
    }

    /// Ensure the storage directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    /// Path for one session's raw report
    fn raw_path(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(format!("{session_id}.json"))
    }

    /// Persist one session's raw report bytes
    pub fn save_raw(&self, session_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.raw_path(session_id);
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        debug!("Wrote report {}", path.display());
        Ok(path)
    }

    /// List all persisted raw report files
    pub fn list_raw(&self) -> Result<Vec<PathBuf>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Load one raw report document
    pub fn load_raw(&self, path: &Path) -> Result<serde_json::Value> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open report {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse report {}", path.display()))
    }

    /// Write the consolidated report document
    pub fn save_merged(&self, document: &serde_json::Value) -> Result<PathBuf> {
        let path = self.merged_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            serde_json::to_string_pretty(document).context("Failed to serialize merged report")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write merged report {}", path.display()))?;

        info!("Wrote merged report {}", path.display());
        Ok(path)
    }

    /// Load the consolidated report, if one has been written
    pub fn load_merged(&self) -> Result<Option<serde_json::Value>> {
        let path = self.merged_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.load_raw(&path)?))
    }

    /// Delete one consumed raw report file
    pub fn delete_raw(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove report {}", path.display()))?;
        Ok(())
    }
}
