//! Command-line surface over the analysis workflow.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::analysis::AnalysisOrchestrator;
use crate::history::{SentimentRecord, SortKey};

/// Sentiment analysis with a persistent, sortable history.
#[derive(Parser, Debug)]
#[command(name = "sentiment-history", version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Analyze text and add the result to the history
    Analyze {
        /// Text to analyze
        text: String,
    },

    /// Show the analysis history
    History {
        /// Ordering: insertion, good-to-bad, bad-to-good, date-asc, date-desc
        #[arg(long, default_value = "insertion")]
        sort: SortKey,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete one record, by position in the (sorted) listing or by id
    Delete {
        /// Position as shown by `history`
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        index: Option<usize>,

        /// Record identifier
        #[arg(long)]
        id: Option<String>,

        /// Ordering the position refers to
        #[arg(long, default_value = "insertion")]
        sort: SortKey,
    },

    /// Delete every record
    Clear,
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command against a hydrated orchestrator.
pub async fn execute_command(command: Commands, orchestrator: &AnalysisOrchestrator) -> CliResult {
    match command {
        Commands::Analyze { text } => match orchestrator.submit(&text).await {
            Ok(record) => CliResult::success(format_record(None, &record)),
            Err(e) => CliResult::error(e.to_string()),
        },
        Commands::History { sort, json } => {
            let view = orchestrator.sort(sort).await;
            if json {
                let records: Vec<&SentimentRecord> = view.iter().map(Arc::as_ref).collect();
                match serde_json::to_string_pretty(&records) {
                    Ok(out) => CliResult::success(out),
                    Err(e) => CliResult::error(format!("Failed to render history: {}", e)),
                }
            } else {
                CliResult::success(format_history(&view, sort))
            }
        }
        Commands::Delete { index, id, sort } => {
            let result = match (index, id) {
                (_, Some(id)) => orchestrator.remove(&id).await,
                (Some(index), None) => {
                    orchestrator.sort(sort).await;
                    orchestrator.remove_at(index).await
                }
                (None, None) => return CliResult::error("Either an index or --id is required"),
            };
            match result {
                Ok(view) => CliResult::success(format!("Deleted. {} record(s) remain.", view.len())),
                Err(e) => CliResult::error(e.to_string()),
            }
        }
        Commands::Clear => {
            orchestrator.clear().await;
            CliResult::success("History cleared.")
        }
    }
}

fn format_history(view: &[Arc<SentimentRecord>], sort: SortKey) -> String {
    if view.is_empty() {
        return "No analysis history yet.".to_string();
    }

    let mut output = format!("Analysis History ({} records, sorted by {}):\n", view.len(), sort);
    for (index, record) in view.iter().enumerate() {
        output.push_str(&format_record(Some(index), record));
        output.push('\n');
    }
    output
}

fn format_record(index: Option<usize>, record: &SentimentRecord) -> String {
    let scores = record.scores();
    let prefix = index.map(|i| format!("[{}] ", i)).unwrap_or_default();
    format!(
        "{}{} {}\n    {}\n    positive {:.2} | negative {:.2} | neutral {:.2} | mixed {:.2}  (id {})",
        prefix,
        record.recorded_at(),
        record.sentiment(),
        record.text(),
        scores.positive,
        scores.negative,
        scores.neutral,
        scores.mixed,
        record.id()
    )
}
