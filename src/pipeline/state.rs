//! Pipeline state threaded through every stage

use crate::extraction::StructuredOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One node of the fixed five-step pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RequirementAnalysis,
    ArchitectureDesign,
    CodeGeneration,
    Validation,
    Deployment,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::RequirementAnalysis,
        Stage::ArchitectureDesign,
        Stage::CodeGeneration,
        Stage::Validation,
        Stage::Deployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RequirementAnalysis => "requirement_analysis",
            Stage::ArchitectureDesign => "architecture_design",
            Stage::CodeGeneration => "code_generation",
            Stage::Validation => "validation",
            Stage::Deployment => "deployment",
        }
    }

    pub fn index(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline position, including the two terminal states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Started,
    RequirementAnalysis,
    ArchitectureDesign,
    CodeGeneration,
    Validation,
    Deployment,
    Completed,
    Failed,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Completed | Step::Failed)
    }
}

impl From<Stage> for Step {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::RequirementAnalysis => Step::RequirementAnalysis,
            Stage::ArchitectureDesign => Step::ArchitectureDesign,
            Stage::CodeGeneration => Step::CodeGeneration,
            Stage::Validation => Step::Validation,
            Stage::Deployment => Step::Deployment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Completed,
    Fallback,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub step: Stage,
    pub status: LogStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Structured output of requirement analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRequirements {
    /// Game family: 贪吃蛇, 打砖块, 打地鼠, 躲避球, 猜数字, 俄罗斯方块, 跳一跳, 弹球游戏
    pub game_type: String,
    /// Core gameplay mechanics
    #[serde(rename = "core_mechanics")]
    pub mechanics: Vec<String>,
    /// Visual style: 极简, 复古, 卡通, 现代化
    pub visual_style: String,
    /// Difficulty: 简单, 中等, 困难
    pub difficulty: String,
    /// Controls: 键盘方向键, WASD, 鼠标点击, 触摸
    pub controls: Vec<String>,
    /// Extra features: 计分系统, 等级系统, 音效, 动画效果
    pub features: Vec<String>,
}

/// Structured output of architecture design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameArchitecture {
    /// Tech stack, e.g. "Vanilla JS + Canvas API"
    pub tech_stack: String,
    /// Component name to the files it consists of
    pub file_structure: BTreeMap<String, Vec<String>>,
    pub main_components: Vec<String>,
    pub key_functions: Vec<String>,
}

fn string_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

impl StructuredOutput for GameRequirements {
    const NAME: &'static str = "GameRequirements";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "game_type": {
                    "type": "string",
                    "description": "贪吃蛇, 打砖块, 打地鼠, 躲避球, 猜数字, 俄罗斯方块, 跳一跳 or 弹球游戏"
                },
                "core_mechanics": string_list("Core gameplay mechanics"),
                "visual_style": {
                    "type": "string",
                    "enum": ["极简", "复古", "卡通", "现代化"]
                },
                "difficulty": {
                    "type": "string",
                    "enum": ["简单", "中等", "困难"]
                },
                "controls": string_list("键盘方向键, WASD, 鼠标点击 or 触摸"),
                "features": string_list("计分系统, 等级系统, 音效, 动画效果 and similar")
            },
            "required": [
                "game_type", "core_mechanics", "visual_style", "difficulty", "controls", "features"
            ]
        })
    }
}

impl StructuredOutput for GameArchitecture {
    const NAME: &'static str = "GameArchitecture";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "tech_stack": {
                    "type": "string",
                    "description": "For example \"Vanilla JS + Canvas API\""
                },
                "file_structure": {
                    "type": "object",
                    "description": "Component name to the files it consists of",
                    "additionalProperties": { "type": "array", "items": { "type": "string" } }
                },
                "main_components": string_list("Main modules of the game"),
                "key_functions": string_list("Functions the game loop relies on")
            },
            "required": ["tech_stack", "file_structure", "main_components", "key_functions"]
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_name: String,
    pub passed: bool,
    pub message: String,
}

/// How a finished run is summarized to the requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    CompletedWithFallback,
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::CompletedWithFallback => write!(f, "completed-with-fallback"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// The single record owned by one pipeline run
///
/// `log` is append-only and `error` keeps the first failure; use
/// [`PipelineState::push_log`] and [`PipelineState::fail`] instead of touching
/// them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub thread_id: String,
    pub requester_id: String,
    pub raw_input: String,
    pub game_type: Option<String>,
    pub requirements: Option<GameRequirements>,
    pub selected_template: Option<String>,
    pub architecture: Option<GameArchitecture>,
    pub generated_files: Option<BTreeMap<String, String>>,
    pub test_results: Vec<TestResult>,
    pub quality_score: Option<f64>,
    pub deployment_url: Option<String>,
    pub log: Vec<LogEntry>,
    pub current_step: Step,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl PipelineState {
    pub fn new(
        thread_id: impl Into<String>,
        requester_id: impl Into<String>,
        raw_input: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            requester_id: requester_id.into(),
            raw_input: raw_input.into(),
            game_type: None,
            requirements: None,
            selected_template: None,
            architecture: None,
            generated_files: None,
            test_results: Vec::new(),
            quality_score: None,
            deployment_url: None,
            log: Vec::new(),
            current_step: Step::Started,
            error: None,
            started_at: Utc::now(),
        }
    }

    /// Appends a log entry; timestamps never go backwards within a run
    pub fn push_log(&mut self, step: Stage, status: LogStatus, message: impl Into<String>) -> &LogEntry {
        let now = Utc::now();
        let timestamp = match self.log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        self.log.push(LogEntry {
            step,
            status,
            message: message.into(),
            timestamp,
        });
        &self.log[self.log.len() - 1]
    }

    /// Records a hard stage failure; an earlier error is kept
    pub fn fail(&mut self, step: Stage, message: impl Into<String>) {
        let message = message.into();
        if self.error.is_none() {
            self.error = Some(message.clone());
        }
        self.push_log(step, LogStatus::Failed, message);
    }

    pub fn used_fallback(&self) -> bool {
        self.log.iter().any(|e| e.status == LogStatus::Fallback)
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.error.is_some() {
            RunOutcome::Failed
        } else if self.used_fallback() {
            RunOutcome::CompletedWithFallback
        } else {
            RunOutcome::Completed
        }
    }

    /// Terminal position derived from `error`
    pub fn terminal_step(&self) -> Step {
        if self.error.is_some() {
            Step::Failed
        } else {
            Step::Completed
        }
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.generated_files
            .as_ref()
            .and_then(|files| files.get(path))
            .map(String::as_str)
    }
}
