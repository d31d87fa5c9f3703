//! Summary formatters
//!
//! Provides Table, JSON, and CSV output for run summaries. Every spec
//! file appears in the output with an explicit pass/fail/error marker,
//! independent of how its session fared.

use crate::config::GridEndpoints;
use crate::models::{OutcomeStatus, RunSummary, TestOutcome};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// Run summary formatter
pub struct SummaryFormatter {
    format: OutputFormat,
    endpoints: GridEndpoints,
    colorize: bool,
}

impl SummaryFormatter {
    pub fn new(format: OutputFormat, endpoints: GridEndpoints) -> Self {
        Self {
            format,
            endpoints,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format the run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(summary).unwrap_or_default()
            }
            OutputFormat::Csv => self.format_csv(summary),
        }
    }

    /// Link to the session in the grid UI, or a dash when the session
    /// never got created
    fn session_link(&self, outcome: &TestOutcome) -> String {
        outcome
            .session_id
            .as_deref()
            .map(|id| self.endpoints.session_link(id))
            .unwrap_or_else(|| "-".to_string())
    }

    fn status_cell(&self, status: OutcomeStatus) -> String {
        let plain = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return plain;
        }

        match status {
            OutcomeStatus::Passed => format!("\x1b[32m{plain}\x1b[0m"),
            OutcomeStatus::Failed | OutcomeStatus::Errored => format!("\x1b[31m{plain}\x1b[0m"),
        }
    }

    fn format_table(&self, summary: &RunSummary) -> String {
        let spec_width = summary
            .outcomes
            .iter()
            .map(|o| o.spec.as_str().len())
            .chain(std::iter::once("Specfile".len()))
            .max()
            .unwrap_or(8);

        let rule = "─".repeat(spec_width + 40);
        let mut output = String::new();

        output.push_str(&format!("\n{rule}\n"));
        output.push_str(" RESULTS\n");
        output.push_str(&format!("{rule}\n"));
        output.push_str(&format!(
            " {:spec_width$}  {:10}  {}\n",
            "Specfile", "Result", "Session"
        ));
        output.push_str(&format!("{rule}\n"));

        for outcome in &summary.outcomes {
            // The status cell may carry ANSI escapes, so pad the plain
            // text and splice the color in afterwards.
            let plain = format!("{} {}", outcome.status.symbol(), outcome.status);
            let padding = " ".repeat(10usize.saturating_sub(plain.chars().count()));

            output.push_str(&format!(
                " {:spec_width$}  {}{}  {}\n",
                outcome.spec.as_str(),
                self.status_cell(outcome.status),
                padding,
                self.session_link(outcome)
            ));
        }

        output.push_str(&format!("{rule}\n"));
        output.push_str(&format!(
            " Total: {} | Pass: {} | Fail: {} | Error: {}\n",
            summary.total, summary.passed, summary.failed, summary.errored
        ));
        output.push_str(&format!(
            " Pass Rate: {:.1}% | Duration: {}ms\n",
            summary.pass_rate(),
            summary.duration_ms
        ));
        output.push_str(&format!("{rule}\n"));

        output
    }

    fn format_csv(&self, summary: &RunSummary) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let _ = writer.write_record(["spec", "status", "session_id", "link"]);
        for outcome in &summary.outcomes {
            let _ = writer.write_record([
                outcome.spec.as_str(),
                &outcome.status.to_string(),
                outcome.session_id.as_deref().unwrap_or(""),
                &self.session_link(outcome),
            ]);
        }

        writer
            .into_inner()
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }
}
