use crate::models::TickerMetrics;
use serde::Serialize;

/// One line of the streaming analysis feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisProgressEvent {
    /// Emitted once per ticker; `data` is null when the ticker could not be analysed
    Stock {
        data: Option<TickerMetrics>,
        index: usize,
        total: usize,
    },
    /// Emitted once after the last ticker
    Done,
}

impl AnalysisProgressEvent {
    /// Serialize as a single newline-terminated JSON line
    pub fn to_ndjson(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize progress event");
            r#"{"type":"error"}"#.to_string()
        });
        line.push('\n');
        line
    }

    pub fn is_done(&self) -> bool {
        matches!(self, AnalysisProgressEvent::Done)
    }
}
