//! Session and log models
//!
//! Defines spec files, remote sessions, and the log entries the grid
//! streams back while a session runs.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One test file of the local suite, identified by its path relative to
/// the suite root. Fixed at discovery time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecFile(String);

impl SpecFile {
    /// Create a spec file from a suite-relative path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Create a spec file from an absolute path and the suite root it
    /// was discovered under
    pub fn relative_to(root: &Path, path: &Path) -> Self {
        let rel = path.strip_prefix(root).unwrap_or(path);
        Self(rel.to_string_lossy().replace('\\', "/"))
    }

    /// Suite-relative path as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Suite-relative path as a PathBuf
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for SpecFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One remote execution instance. Owned by its poll loop from creation
/// until the loop reaches a terminal state.
#[derive(Clone, Debug)]
pub struct Session {
    /// Identifier assigned by the grid on creation
    pub id: String,

    /// Spec file this session is running
    pub spec: SpecFile,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Record a freshly created session
    pub fn new(id: impl Into<String>, spec: SpecFile) -> Self {
        Self {
            id: id.into(),
            spec,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.spec)
    }
}

/// One unit of progress data returned by a poll call.
///
/// The grid marks the terminal entry of a session by attaching a
/// `success` field; all other fields are free-form and passed through.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// Verdict marker, present only on the terminal entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Free-form payload
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl LogEntry {
    /// Progress entry with a free-form payload
    pub fn progress(payload: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            success: None,
            payload,
        }
    }

    /// Terminal entry carrying the session verdict
    pub fn terminal(passed: bool) -> Self {
        Self {
            success: Some(passed),
            payload: serde_json::Map::new(),
        }
    }

    /// Whether this entry carries the session verdict
    pub fn is_terminal(&self) -> bool {
        self.success.is_some()
    }

    /// Classify the wire entry into a poll event
    pub fn into_event(self) -> PollEvent {
        match self.success {
            Some(passed) => PollEvent::Terminal { passed },
            None => PollEvent::Progress(self),
        }
    }
}

/// Classified poll result: either more progress to buffer, or the
/// verdict that ends the session's polling loop.
#[derive(Clone, Debug)]
pub enum PollEvent {
    /// Intermediate entry, appended to the session's log buffer
    Progress(LogEntry),

    /// Verdict entry; `passed` becomes the outcome
    Terminal {
        /// Whether the spec passed
        passed: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_spec_file_relative() {
        let spec = SpecFile::relative_to(
            Path::new("/work/suite"),
            Path::new("/work/suite/integration/login.spec.js"),
        );
        assert_eq!(spec.as_str(), "integration/login.spec.js");
    }

    #[test]
    fn test_log_entry_classification() {
        let progress: LogEntry = serde_json::from_str(r#"{"message":"visiting /"}"#).unwrap();
        assert!(!progress.is_terminal());
        assert!(matches!(progress.into_event(), PollEvent::Progress(_)));

        let terminal: LogEntry = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(terminal.is_terminal());
        assert!(matches!(
            terminal.into_event(),
            PollEvent::Terminal { passed: false }
        ));
    }

    #[test]
    fn test_log_entry_payload_roundtrip() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"message":"step 1","level":"info"}"#).unwrap();
        assert_eq!(entry.payload.len(), 2);

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("success").is_none());
        assert_eq!(json["message"], "step 1");
    }

    #[test]
    fn test_session_display() {
        let session = Session::new("abc123", SpecFile::new("a.spec.js"));
        assert_eq!(session.to_string(), "abc123 [a.spec.js]");
    }
}
