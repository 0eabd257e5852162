use crate::pipeline::context::PipelineContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::state::{GameRequirements, LogStatus, PipelineState, Stage};
use async_trait::async_trait;
use tracing::{error, info};

const INSTRUCTION: &str = r#"You are a game requirements analyst. Read the player's free-form description of a small browser game and extract its key properties.

Fields:
- game_type: the game family
- core_mechanics: core gameplay mechanics
- visual_style: 极简, 复古, 卡通 or 现代化
- difficulty: 简单, 中等 or 困难
- controls: 键盘方向键, WASD, 鼠标点击, 触摸
- features: extras such as 计分系统, 等级系统, 音效, 动画效果

Supported game types: 贪吃蛇, 打砖块, 打地鼠, 躲避球, 猜数字, 俄罗斯方块, 跳一跳, 弹球游戏"#;

pub struct RequirementAnalysisPhase;

#[async_trait]
impl StagePhase for RequirementAnalysisPhase {
    fn stage(&self) -> Stage {
        Stage::RequirementAnalysis
    }

    async fn execute(&self, context: &PipelineContext, mut state: PipelineState) -> PipelineState {
        info!(input = %state.raw_input, "Analyzing requirements");

        let result = context
            .extractor(context.config.analysis_max_tokens)
            .extract::<GameRequirements>(self.stage().as_str(), INSTRUCTION, &state.raw_input)
            .await;

        match result {
            Ok(requirements) => {
                info!(game_type = %requirements.game_type, "Requirements analyzed");
                state.push_log(
                    self.stage(),
                    LogStatus::Completed,
                    format!("Requirements analyzed: {}", requirements.game_type),
                );
                state.game_type = Some(requirements.game_type.clone());
                state.requirements = Some(requirements);
            }
            Err(e) => {
                error!("Requirement analysis failed: {}", e);
                state.fail(self.stage(), format!("Requirement analysis failed: {}", e));
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use crate::pipeline::config::PipelineConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn context(client: MockLLMClient) -> PipelineContext {
        PipelineContext::minimal(Arc::new(client), PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_requirements_extracted() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({
            "game_type": "贪吃蛇",
            "core_mechanics": ["蛇的移动", "吃食物"],
            "visual_style": "极简",
            "difficulty": "简单",
            "controls": ["键盘方向键"],
            "features": ["计分系统"]
        })));
        let ctx = context(client);

        let state = RequirementAnalysisPhase
            .execute(&ctx, PipelineState::new("t", "u1", "a snake game"))
            .await;

        assert_eq!(state.game_type.as_deref(), Some("贪吃蛇"));
        assert_eq!(state.requirements.as_ref().unwrap().controls, vec!["键盘方向键"]);
        assert!(state.error.is_none());
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.log[0].status, LogStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_field_fails_stage() {
        let client = MockLLMClient::new();
        client.add_response(MockResponse::json(json!({"game_type": "贪吃蛇"})));
        let ctx = context(client);

        let state = RequirementAnalysisPhase
            .execute(&ctx, PipelineState::new("t", "u1", "a snake game"))
            .await;

        assert!(state.requirements.is_none());
        assert!(state.game_type.is_none());
        assert!(state.error.as_deref().unwrap().starts_with("Requirement analysis failed"));
        assert_eq!(state.log[0].status, LogStatus::Failed);
    }
}
