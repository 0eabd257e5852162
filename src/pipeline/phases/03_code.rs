use super::fallback::reference_bundle;
use crate::extraction::json_block::{self, JsonBlockResult};
use crate::llm::LLMRequest;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::state::{GameArchitecture, GameRequirements, LogStatus, PipelineState, Stage};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

const INSTRUCTION: &str = r#"You are an expert browser game developer. Generate complete, runnable game code.

Requirements:
1. HTML files include a full DOCTYPE and head
2. JavaScript contains all of the game logic
3. CSS is clean and responsive
4. Code is well commented
5. The game has start, pause and restart
6. The game keeps a score
7. The game shows a game-over message

Respond with JSON of the form:
{"files": {"<relative path>": "<file content>"}}"#;

#[derive(Debug, Deserialize)]
struct CodeBundle {
    files: BTreeMap<String, String>,
}

fn build_payload(requirements: &GameRequirements, architecture: &GameArchitecture) -> String {
    format!(
        "Generate the complete code for a {} game.\n\n\
         Requirements:\n\
         - Game type: {}\n\
         - Core mechanics: {}\n\
         - Visual style: {}\n\
         - Difficulty: {}\n\
         - Controls: {}\n\
         - Features: {}\n\n\
         Architecture:\n\
         - Tech stack: {}\n\
         - Main components: {}\n\
         - Key functions: {}",
        requirements.game_type,
        requirements.game_type,
        requirements.mechanics.join(", "),
        requirements.visual_style,
        requirements.difficulty,
        requirements.controls.join(", "),
        requirements.features.join(", "),
        architecture.tech_stack,
        architecture.main_components.join(", "),
        architecture.key_functions.join(", "),
    )
}

/// Accepts model output only if it carries a `files` map containing the entry file
fn accept_files(raw: &str, entry_file: &str) -> Result<BTreeMap<String, String>, String> {
    let value = match json_block::parse(raw) {
        JsonBlockResult::Parsed { value, .. } => value,
        JsonBlockResult::Empty => return Err("response is empty".to_string()),
        JsonBlockResult::Malformed { error, .. } => {
            return Err(format!("response is not valid JSON: {}", error))
        }
    };

    let bundle: CodeBundle = serde_json::from_value(value)
        .map_err(|e| format!("response has no usable files map: {}", e))?;

    if !bundle.files.contains_key(entry_file) {
        return Err(format!("response is missing {}", entry_file));
    }

    Ok(bundle.files)
}

pub struct CodeGenerationPhase;

impl CodeGenerationPhase {
    async fn generate(
        &self,
        context: &PipelineContext,
        requirements: &GameRequirements,
        architecture: &GameArchitecture,
    ) -> Result<BTreeMap<String, String>, String> {
        let request = LLMRequest::prompt(INSTRUCTION, build_payload(requirements, architecture))
        .with_temperature(context.config.temperature)
        .with_max_tokens(context.config.code_max_tokens);

        let start = Instant::now();
        let response = context.llm_client.chat(request.clone()).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let response = match response {
            Ok(response) => {
                context
                    .exchange_log
                    .record(self.stage().as_str(), &request, Ok(&response), latency_ms);
                response
            }
            Err(e) => {
                let message = e.to_string();
                context
                    .exchange_log
                    .record(self.stage().as_str(), &request, Err(message.as_str()), latency_ms);
                return Err(format!("model call failed: {}", message));
            }
        };

        debug!(latency_ms, chars = response.content.len(), "Code response received");
        accept_files(&response.content, &context.config.entry_file)
    }

    fn fall_back(&self, context: &PipelineContext, state: &mut PipelineState, reason: &str) {
        warn!("Code generation fell back to the reference game: {}", reason);
        state.generated_files = Some(reference_bundle(&context.config.entry_file));
        state.push_log(
            self.stage(),
            LogStatus::Fallback,
            format!("Using built-in reference game: {}", reason),
        );
    }
}

#[async_trait]
impl StagePhase for CodeGenerationPhase {
    fn stage(&self) -> Stage {
        Stage::CodeGeneration
    }

    async fn execute(&self, context: &PipelineContext, mut state: PipelineState) -> PipelineState {
        let (Some(requirements), Some(architecture)) =
            (state.requirements.clone(), state.architecture.clone())
        else {
            self.fall_back(context, &mut state, "requirements or architecture are missing");
            return state;
        };

        info!(tech_stack = %architecture.tech_stack, "Generating code");

        match self.generate(context, &requirements, &architecture).await {
            Ok(files) => {
                info!(files = files.len(), "Code generated");
                state.push_log(
                    self.stage(),
                    LogStatus::Completed,
                    format!("Code generated, {} files", files.len()),
                );
                state.generated_files = Some(files);
            }
            Err(reason) => self.fall_back(context, &mut state, &reason),
        }

        state
    }
}
