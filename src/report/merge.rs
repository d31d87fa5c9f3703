//! Report aggregation
//!
//! Merges all persisted per-session reports into one consolidated
//! document and deletes the consumed inputs.

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::ReportStore;

/// Result of a merge pass
#[derive(Clone, Debug)]
pub struct MergedReport {
    /// Where the consolidated document was written
    pub path: PathBuf,

    /// Number of per-session reports consumed
    pub sessions: usize,

    /// The consolidated document
    pub document: Value,
}

/// Merges per-session raw reports into a single document.
///
/// Reports share a common shape: a `stats` object of counters and a
/// `results` array of test-case records. Counters are summed and
/// record arrays concatenated; everything else is passed through from
/// the first document seen. Input order does not affect the totals,
/// and duplicate sessions are impossible because filenames are keyed
/// by session id.
pub struct ReportAggregator {
    store: Arc<ReportStore>,
}

impl ReportAggregator {
    pub fn new(store: Arc<ReportStore>) -> Self {
        Self { store }
    }

    /// Merge every persisted raw report, write the consolidated
    /// document, and delete the consumed files.
    pub fn merge_all(&self) -> Result<MergedReport> {
        let paths = self.store.list_raw()?;

        let mut documents = Vec::new();
        for path in &paths {
            match self.store.load_raw(path) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    // A corrupt report is dropped from the merge; the
                    // outcome for its session is already recorded.
                    warn!("Skipping unreadable report {}: {e}", path.display());
                }
            }
        }

        let merged = merge_documents(&documents);
        let path = self.store.save_merged(&merged)?;

        for raw in &paths {
            if let Err(e) = self.store.delete_raw(raw) {
                warn!("Could not remove consumed report {}: {e}", raw.display());
            }
        }

        debug!("Merged {} session reports", documents.len());
        Ok(MergedReport {
            path,
            sessions: documents.len(),
            document: merged,
        })
    }
}

/// Combine report documents: summed `stats`, concatenated `results`,
/// remaining keys from the first document.
pub fn merge_documents(documents: &[Value]) -> Value {
    let mut stats: Map<String, Value> = Map::new();
    let mut results: Vec<Value> = Vec::new();
    let mut extra: Map<String, Value> = Map::new();

    for doc in documents {
        let Some(obj) = doc.as_object() else {
            continue;
        };

        if let Some(doc_stats) = obj.get("stats").and_then(Value::as_object) {
            for (key, value) in doc_stats {
                merge_stat(&mut stats, key, value);
            }
        }

        if let Some(doc_results) = obj.get("results").and_then(Value::as_array) {
            results.extend(doc_results.iter().cloned());
        }

        for (key, value) in obj {
            if key != "stats" && key != "results" && !extra.contains_key(key) {
                extra.insert(key.clone(), value.clone());
            }
        }
    }

    let mut merged = extra;
    merged.insert("stats".to_string(), Value::Object(stats));
    merged.insert("results".to_string(), Value::Array(results));
    Value::Object(merged)
}

/// Fold one stats field into the accumulator; numbers are summed,
/// anything else keeps its first value.
fn merge_stat(stats: &mut Map<String, Value>, key: &str, value: &Value) {
    match stats.get(key) {
        Some(existing) => {
            if let (Some(a), Some(b)) = (existing.as_i64(), value.as_i64()) {
                stats.insert(key.to_string(), Value::from(a + b));
            } else if let (Some(a), Some(b)) = (existing.as_f64(), value.as_f64()) {
                stats.insert(key.to_string(), Value::from(a + b));
            }
        }
        None => {
            stats.insert(key.to_string(), value.clone());
        }
    }
}
