//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use crate::pipeline::state::{LogStatus, RunOutcome};
use tracing::{debug, error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                thread_id,
                requester_id,
            } => {
                info!(thread = %thread_id, requester = %requester_id, "Starting generation run");
            }
            ProgressEvent::RunResumed { thread_id, from } => {
                info!(thread = %thread_id, from = %from, "Resuming generation run");
            }
            ProgressEvent::StageStarted { thread_id, stage } => {
                info!(thread = %thread_id, stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete {
                thread_id,
                stage,
                duration,
            } => {
                info!(
                    thread = %thread_id,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::LogAppended { thread_id, entry } => match entry.status {
                LogStatus::Completed => {
                    debug!(thread = %thread_id, step = %entry.step, "{}", entry.message);
                }
                LogStatus::Fallback => {
                    warn!(thread = %thread_id, step = %entry.step, "{}", entry.message);
                }
                LogStatus::Failed => {
                    error!(thread = %thread_id, step = %entry.step, "{}", entry.message);
                }
            },
            ProgressEvent::CheckpointFailed { thread_id, error } => {
                warn!(thread = %thread_id, error = %error, "Checkpoint not saved");
            }
            ProgressEvent::RunFinished {
                thread_id,
                outcome,
                total_time,
            } => {
                if *outcome == RunOutcome::Failed {
                    warn!(
                        thread = %thread_id,
                        total_time_ms = total_time.as_millis(),
                        "Generation run failed"
                    );
                } else {
                    info!(
                        thread = %thread_id,
                        outcome = %outcome,
                        total_time_ms = total_time.as_millis(),
                        "Generation run complete"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::{LogEntry, Stage};
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;
        let entry = |status| LogEntry {
            step: Stage::CodeGeneration,
            status,
            message: "m".to_string(),
            timestamp: Utc::now(),
        };

        // Test all event types to ensure they don't panic
        let events = vec![
            ProgressEvent::RunStarted {
                thread_id: "t".to_string(),
                requester_id: "u1".to_string(),
            },
            ProgressEvent::RunResumed {
                thread_id: "t".to_string(),
                from: Stage::Validation,
            },
            ProgressEvent::StageStarted {
                thread_id: "t".to_string(),
                stage: Stage::RequirementAnalysis,
            },
            ProgressEvent::StageComplete {
                thread_id: "t".to_string(),
                stage: Stage::RequirementAnalysis,
                duration: Duration::from_millis(100),
            },
            ProgressEvent::LogAppended {
                thread_id: "t".to_string(),
                entry: entry(LogStatus::Completed),
            },
            ProgressEvent::LogAppended {
                thread_id: "t".to_string(),
                entry: entry(LogStatus::Fallback),
            },
            ProgressEvent::LogAppended {
                thread_id: "t".to_string(),
                entry: entry(LogStatus::Failed),
            },
            ProgressEvent::CheckpointFailed {
                thread_id: "t".to_string(),
                error: "disk full".to_string(),
            },
            ProgressEvent::RunFinished {
                thread_id: "t".to_string(),
                outcome: RunOutcome::Completed,
                total_time: Duration::from_secs(5),
            },
            ProgressEvent::RunFinished {
                thread_id: "t".to_string(),
                outcome: RunOutcome::Failed,
                total_time: Duration::from_secs(5),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
