//! Progress handler trait and events

use crate::pipeline::state::{LogEntry, RunOutcome, Stage};
use std::time::Duration;

/// Events emitted while a pipeline run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A new run started
    RunStarted {
        thread_id: String,
        requester_id: String,
    },

    /// A run was picked up again from its last checkpoint
    RunResumed { thread_id: String, from: Stage },

    /// Stage started
    StageStarted { thread_id: String, stage: Stage },

    /// Stage finished (whatever it wrote into the state)
    StageComplete {
        thread_id: String,
        stage: Stage,
        duration: Duration,
    },

    /// A stage appended an entry to the run log
    LogAppended { thread_id: String, entry: LogEntry },

    /// Checkpoint could not be saved; the run continues
    CheckpointFailed { thread_id: String, error: String },

    /// Run reached its terminal state
    RunFinished {
        thread_id: String,
        outcome: RunOutcome,
        total_time: Duration,
    },
}

impl ProgressEvent {
    pub fn thread_id(&self) -> &str {
        match self {
            ProgressEvent::RunStarted { thread_id, .. }
            | ProgressEvent::RunResumed { thread_id, .. }
            | ProgressEvent::StageStarted { thread_id, .. }
            | ProgressEvent::StageComplete { thread_id, .. }
            | ProgressEvent::LogAppended { thread_id, .. }
            | ProgressEvent::CheckpointFailed { thread_id, .. }
            | ProgressEvent::RunFinished { thread_id, .. } => thread_id,
        }
    }
}

/// Observer of a run; called synchronously from the orchestrator
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
