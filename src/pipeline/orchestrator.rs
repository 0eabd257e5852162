use super::checkpoint::{Checkpoint, CheckpointError, CheckpointStore, InMemoryCheckpointStore};
use super::context::PipelineContext;
use super::phase_trait::StagePhase;
use super::phases::{
    ArchitectureDesignPhase, CodeGenerationPhase, DeploymentPhase, RequirementAnalysisPhase,
    ValidationPhase,
};
use super::state::{PipelineState, Stage, Step};
use crate::progress::{ProgressEvent, ProgressHandler};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a run cannot start; stage failures never surface here
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid requester id {0:?}: use ASCII letters, digits, '-' or '_'")]
    InvalidRequesterId(String),

    #[error("invalid thread id {0:?}: use ASCII letters, digits, '-' or '_'")]
    InvalidThreadId(String),

    #[error("no checkpoint for thread {0:?}")]
    UnknownThread(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("pipeline task for thread {thread_id:?} did not finish: {message}")]
    TaskFailed { thread_id: String, message: String },
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `gen_{requester}_{unix seconds}`
pub fn default_thread_id(requester_id: &str) -> String {
    format!("gen_{}_{}", requester_id, Utc::now().timestamp())
}

/// Runs the five stages in order, checkpointing after each
///
/// Each run executes on its own tokio task. Dropping the future returned by
/// [`run`](Self::run) or [`resume`](Self::resume) detaches the caller only:
/// the stage in flight finishes and its result is checkpointed.
pub struct PipelineOrchestrator {
    runner: StageRunner,
}

/// Everything a detached run needs, cheap to clone into its task
#[derive(Clone)]
struct StageRunner {
    context: Arc<PipelineContext>,
    checkpoints: Arc<dyn CheckpointStore>,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
    phases: Arc<[Box<dyn StagePhase>]>,
}

impl PipelineOrchestrator {
    pub fn new(context: PipelineContext) -> Self {
        let phases: Vec<Box<dyn StagePhase>> = vec![
            Box::new(RequirementAnalysisPhase),
            Box::new(ArchitectureDesignPhase),
            Box::new(CodeGenerationPhase),
            Box::new(ValidationPhase),
            Box::new(DeploymentPhase),
        ];
        Self {
            runner: StageRunner {
                context: Arc::new(context),
                checkpoints: Arc::new(InMemoryCheckpointStore::new()),
                progress_handler: None,
                phases: phases.into(),
            },
        }
    }

    pub fn with_checkpoints(mut self, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        self.runner.checkpoints = checkpoints;
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.runner.progress_handler = Some(handler);
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.runner.context
    }

    pub fn checkpoints(&self) -> &Arc<dyn CheckpointStore> {
        &self.runner.checkpoints
    }

    /// Runs a fresh generation
    ///
    /// Returns `Err` only for invalid identifiers or a panicked run task.
    /// Every other failure ends up in the returned state's `error` and log.
    pub async fn run(
        &self,
        requester_id: &str,
        raw_input: &str,
        thread_id: Option<&str>,
    ) -> Result<PipelineState, PipelineError> {
        if !is_valid_id(requester_id) {
            return Err(PipelineError::InvalidRequesterId(requester_id.to_string()));
        }
        let thread_id = match thread_id {
            Some(id) if is_valid_id(id) => id.to_string(),
            Some(id) => return Err(PipelineError::InvalidThreadId(id.to_string())),
            None => default_thread_id(requester_id),
        };

        self.runner.emit(ProgressEvent::RunStarted {
            thread_id: thread_id.clone(),
            requester_id: requester_id.to_string(),
        });

        let state = PipelineState::new(thread_id, requester_id, raw_input);
        self.spawn_from(Stage::RequirementAnalysis, state).await
    }

    /// Continues a run from the stage after its latest checkpoint
    ///
    /// A finished run is returned as checkpointed without running anything.
    pub async fn resume(&self, thread_id: &str) -> Result<PipelineState, PipelineError> {
        if !is_valid_id(thread_id) {
            return Err(PipelineError::InvalidThreadId(thread_id.to_string()));
        }
        let checkpoint = self
            .runner
            .checkpoints
            .latest(thread_id)
            .await?
            .ok_or_else(|| PipelineError::UnknownThread(thread_id.to_string()))?;

        match checkpoint.next_stage() {
            Some(next) => {
                info!(thread = %thread_id, from = %next, "Resuming from checkpoint");
                self.runner.emit(ProgressEvent::RunResumed {
                    thread_id: thread_id.to_string(),
                    from: next,
                });
                self.spawn_from(next, checkpoint.state).await
            }
            None => {
                debug!(thread = %thread_id, "Run already finished");
                Ok(checkpoint.state)
            }
        }
    }

    async fn spawn_from(
        &self,
        first: Stage,
        state: PipelineState,
    ) -> Result<PipelineState, PipelineError> {
        let thread_id = state.thread_id.clone();
        let runner = self.runner.clone();
        tokio::spawn(async move { runner.execute_from(first, state).await })
            .await
            .map_err(|e| PipelineError::TaskFailed {
                thread_id,
                message: e.to_string(),
            })
    }
}

impl StageRunner {
    async fn execute_from(&self, first: Stage, mut state: PipelineState) -> PipelineState {
        let start = Instant::now();
        let thread_id = state.thread_id.clone();

        for phase in self.phases.iter().skip(first.index()) {
            let stage = phase.stage();
            state.current_step = Step::from(stage);
            self.emit(ProgressEvent::StageStarted {
                thread_id: thread_id.clone(),
                stage,
            });

            let stage_start = Instant::now();
            let log_len = state.log.len();
            state = phase.execute(&self.context, state).await;

            for entry in &state.log[log_len..] {
                self.emit(ProgressEvent::LogAppended {
                    thread_id: thread_id.clone(),
                    entry: entry.clone(),
                });
            }

            state.current_step = match stage.next() {
                Some(next) => Step::from(next),
                None => state.terminal_step(),
            };
            self.save_checkpoint(stage, &state).await;

            self.emit(ProgressEvent::StageComplete {
                thread_id: thread_id.clone(),
                stage,
                duration: stage_start.elapsed(),
            });
        }

        let outcome = state.outcome();
        info!(thread = %thread_id, outcome = %outcome, "Pipeline finished");
        self.emit(ProgressEvent::RunFinished {
            thread_id,
            outcome,
            total_time: start.elapsed(),
        });

        state
    }

    async fn save_checkpoint(&self, stage: Stage, state: &PipelineState) {
        if let Err(e) = self.checkpoints.save(&Checkpoint::new(stage, state)).await {
            warn!("Failed to save checkpoint after {}: {}", stage, e);
            self.emit(ProgressEvent::CheckpointFailed {
                thread_id: state.thread_id.clone(),
                error: e.to_string(),
            });
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLLMClient;
    use crate::pipeline::config::PipelineConfig;

    fn orchestrator() -> PipelineOrchestrator {
        PipelineOrchestrator::new(PipelineContext::minimal(
            Arc::new(MockLLMClient::new()),
            PipelineConfig::default(),
        ))
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("user_42-a"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id("用户"));
    }

    #[test]
    fn test_default_thread_id() {
        let id = default_thread_id("u1");
        assert!(id.starts_with("gen_u1_"));
        assert!(is_valid_id(&id));
    }

    #[tokio::test]
    async fn test_invalid_requester_rejected() {
        let err = orchestrator().run("", "snake", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequesterId(_)));

        let err = orchestrator().run("a b", "snake", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequesterId(_)));
    }

    #[tokio::test]
    async fn test_invalid_thread_rejected() {
        let err = orchestrator().run("u1", "snake", Some("")).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidThreadId(_)));
    }

    #[tokio::test]
    async fn test_resume_unknown_thread() {
        let err = orchestrator().resume("missing").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownThread(_)));
    }

    #[test]
    fn test_phases_in_stage_order() {
        let o = orchestrator();
        let stages: Vec<Stage> = o.runner.phases.iter().map(|p| p.stage()).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }
}
