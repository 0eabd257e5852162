pub mod checkpoint;
pub mod config;
pub mod context;
pub mod deploy;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;
pub mod record;
pub mod state;

pub use checkpoint::{
    Checkpoint, CheckpointError, CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore,
};
pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use deploy::DeploymentError;
pub use orchestrator::{default_thread_id, PipelineError, PipelineOrchestrator};
pub use phase_trait::StagePhase;
pub use record::{JsonFileSink, RunRecord, RunSink, StepRecord, StepType};
pub use state::{
    GameArchitecture, GameRequirements, LogEntry, LogStatus, PipelineState, RunOutcome, Stage,
    Step, TestResult,
};
