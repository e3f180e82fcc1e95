//! Structured event names and run context.
//!
//! Every event uses its name as the tracing target, so JSONL consumers can
//! filter on `target` without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages of a `dx` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and network loading.
    Init,
    /// Network construction.
    Build,
    /// Enumeration queries.
    Infer,
    /// Candidate ranking.
    Diagnose,
    /// Writing the payload.
    Output,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Build => "build",
            Stage::Infer => "infer",
            Stage::Diagnose => "diagnose",
            Stage::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_FAILED: &str = "run.failed";

    // Config/init
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Network construction
    pub const NETWORK_BUILT: &str = "network.built";

    // Queries
    pub const QUERY_STARTED: &str = "query.started";
    pub const QUERY_FINISHED: &str = "query.finished";

    // Diagnosis
    pub const DIAGNOSE_FINISHED: &str = "diagnose.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation fields attached to run-level events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
    pub command: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, command: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            command: command.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Build,
            Stage::Infer,
            Stage::Diagnose,
            Stage::Output,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names_are_dotted() {
        for name in [
            event_names::RUN_STARTED,
            event_names::CONFIG_LOADED,
            event_names::QUERY_STARTED,
            event_names::QUERY_FINISHED,
            event_names::DIAGNOSE_FINISHED,
        ] {
            assert!(name.contains('.'), "{}", name);
        }
    }
}
