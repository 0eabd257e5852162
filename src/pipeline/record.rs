//! Durable summaries of finished runs, handed to a persistence sink

use super::state::{LogStatus, PipelineState, RunOutcome, Stage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Coarse category of a log entry, as stored by persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Analysis,
    Design,
    Coding,
    Testing,
    Deployment,
}

impl From<Stage> for StepType {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::RequirementAnalysis => StepType::Analysis,
            Stage::ArchitectureDesign => StepType::Design,
            Stage::CodeGeneration => StepType::Coding,
            Stage::Validation => StepType::Testing,
            Stage::Deployment => StepType::Deployment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_name: String,
    pub step_type: StepType,
    pub status: LogStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub thread_id: String,
    pub requester_id: String,
    pub description: String,
    pub status: RunOutcome,
    pub game_type: Option<String>,
    pub tech_stack: Option<String>,
    pub selected_template: Option<String>,
    pub files: BTreeMap<String, String>,
    pub deployment_url: Option<String>,
    pub quality_score: Option<f64>,
    pub error: Option<String>,
    pub generation_seconds: f64,
    pub steps: Vec<StepRecord>,
}

impl RunRecord {
    pub fn from_state(state: &PipelineState) -> Self {
        let finished_at = state
            .log
            .last()
            .map(|entry| entry.timestamp)
            .unwrap_or(state.started_at);
        let generation_seconds =
            (finished_at - state.started_at).num_milliseconds().max(0) as f64 / 1000.0;

        let steps = state
            .log
            .iter()
            .map(|entry| StepRecord {
                step_name: entry.step.as_str().to_string(),
                step_type: StepType::from(entry.step),
                status: entry.status,
                message: entry.message.clone(),
                timestamp: entry.timestamp,
            })
            .collect();

        Self {
            thread_id: state.thread_id.clone(),
            requester_id: state.requester_id.clone(),
            description: state.raw_input.clone(),
            status: state.outcome(),
            game_type: state.game_type.clone(),
            tech_stack: state.architecture.as_ref().map(|a| a.tech_stack.clone()),
            selected_template: state.selected_template.clone(),
            files: state.generated_files.clone().unwrap_or_default(),
            deployment_url: state.deployment_url.clone(),
            quality_score: state.quality_score,
            error: state.error.clone(),
            generation_seconds,
            steps,
        }
    }
}

/// Opaque persistence collaborator for finished runs
#[async_trait]
pub trait RunSink: Send + Sync {
    async fn store(&self, record: &RunRecord) -> Result<()>;
}

/// Writes each run as `<dir>/<thread_id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", thread_id))
    }
}

#[async_trait]
impl RunSink for JsonFileSink {
    async fn store(&self, record: &RunRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create record directory {:?}", self.dir))?;

        let path = self.path_for(&record.thread_id);
        let json = serde_json::to_string_pretty(record).context("Failed to serialize run record")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write run record {:?}", path))?;
        Ok(())
    }
}
