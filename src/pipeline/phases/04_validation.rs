use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::state::{LogStatus, PipelineState, Stage};
use crate::validation::{quality_score, GameBundle};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Heuristic structural checks; deployment proceeds whatever the score
pub struct ValidationPhase;

#[async_trait]
impl StagePhase for ValidationPhase {
    fn stage(&self) -> Stage {
        Stage::Validation
    }

    async fn execute(&self, context: &PipelineContext, mut state: PipelineState) -> PipelineState {
        let empty = BTreeMap::new();
        let files = state.generated_files.as_ref().unwrap_or(&empty);

        let results = context.validator.validate(&GameBundle {
            files,
            entry_file: &context.config.entry_file,
            min_entry_length: context.config.min_entry_length,
        });
        let score = quality_score(&results);

        for failed in results.iter().filter(|r| !r.passed) {
            warn!(check = %failed.test_name, "Validation check failed: {}", failed.message);
        }
        info!(score, "Validation complete");

        state.test_results = results;
        state.quality_score = Some(score);
        state.push_log(
            self.stage(),
            LogStatus::Completed,
            format!("Validation complete, quality score: {}", score),
        );

        state
    }
}
