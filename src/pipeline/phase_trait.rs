use super::context::PipelineContext;
use super::state::{PipelineState, Stage};
use async_trait::async_trait;

/// One stage of the generation pipeline
///
/// `execute` is total: failures are written into the returned state (the
/// `error` field plus a `failed` log entry), never raised.
#[async_trait]
pub trait StagePhase: Send + Sync {
    fn stage(&self) -> Stage;

    async fn execute(&self, context: &PipelineContext, state: PipelineState) -> PipelineState;
}
