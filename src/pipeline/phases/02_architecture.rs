use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::state::{GameArchitecture, GameRequirements, LogStatus, PipelineState, Stage};
use crate::templates::TemplateRecord;
use async_trait::async_trait;
use tracing::{debug, error, info};

const INSTRUCTION: &str = r#"You are a browser game architect. Design the technical architecture for the requirements given.

Tech stack rules:
- 贪吃蛇, 打地鼠, 躲避球, 猜数字 -> Vanilla JS + Canvas API
- 打砖块, 俄罗斯方块 -> Vanilla JS + Canvas API
- anything more complex -> Phaser 3

Use a clear file structure:
- index.html: main page
- styles.css: styles
- game.js: game logic
- assets/: images"#;

fn build_payload(requirements: &GameRequirements, template: Option<&TemplateRecord>) -> String {
    let mut payload = format!(
        "Game type: {}\nCore mechanics: {}\nVisual style: {}\nDifficulty: {}\nControls: {}\nFeatures: {}",
        requirements.game_type,
        requirements.mechanics.join(", "),
        requirements.visual_style,
        requirements.difficulty,
        requirements.controls.join(", "),
        requirements.features.join(", "),
    );

    if let Some(template) = template {
        let files: Vec<String> = template
            .file_structure
            .iter()
            .map(|(file, role)| format!("{} ({})", file, role))
            .collect();
        payload.push_str(&format!(
            "\n\nClosest reference template: {} ({})\nReference tech stack: {}\nReference files: {}",
            template.name,
            template.description,
            template.tech_stack,
            files.join(", "),
        ));
    }

    payload
}

pub struct ArchitectureDesignPhase;

#[async_trait]
impl StagePhase for ArchitectureDesignPhase {
    fn stage(&self) -> Stage {
        Stage::ArchitectureDesign
    }

    async fn execute(&self, context: &PipelineContext, mut state: PipelineState) -> PipelineState {
        let Some(requirements) = state.requirements.clone() else {
            error!("Architecture design skipped: no requirements");
            state.fail(
                self.stage(),
                "Architecture design failed: requirements are missing",
            );
            return state;
        };

        info!(game_type = %requirements.game_type, "Designing architecture");

        let template = match &context.retriever {
            Some(retriever) => {
                let query = format!("{} {}", requirements.game_type, requirements.mechanics.join(" "));
                let template = retriever.search(&query, 1).await.into_iter().next();
                if let Some(t) = &template {
                    debug!(template = %t.id, "Selected reference template");
                    state.selected_template = Some(t.id.clone());
                }
                template
            }
            None => None,
        };

        let result = context
            .extractor(context.config.design_max_tokens)
            .extract::<GameArchitecture>(
                self.stage().as_str(),
                INSTRUCTION,
                &build_payload(&requirements, template.as_ref()),
            )
            .await;

        match result {
            Ok(architecture) => {
                info!(tech_stack = %architecture.tech_stack, "Architecture designed");
                state.push_log(
                    self.stage(),
                    LogStatus::Completed,
                    format!("Architecture designed, tech stack: {}", architecture.tech_stack),
                );
                state.architecture = Some(architecture);
            }
            Err(e) => {
                error!("Architecture design failed: {}", e);
                state.fail(self.stage(), format!("Architecture design failed: {}", e));
            }
        }

        state
    }
}
