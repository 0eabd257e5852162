//! Output formatting for runs, templates and configuration
//!
//! JSON output is meant for scripts; human output for a terminal.

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::GamesmithConfig;
use crate::pipeline::{LogStatus, PipelineState, RunOutcome, RunRecord};
use crate::templates::TemplateRecord;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a finished (or failed) run
    pub fn format_run(&self, state: &PipelineState) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&RunRecord::from_state(state))
                .context("Failed to serialize run to JSON"),
            OutputFormat::Human => Ok(self.format_run_human(state)),
        }
    }

    /// Formats ranked or listed templates
    pub fn format_templates(&self, templates: &[TemplateRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(templates)
                .context("Failed to serialize templates to JSON"),
            OutputFormat::Human => Ok(self.format_templates_human(templates)),
        }
    }

    pub fn format_config(&self, config: &GamesmithConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize configuration to JSON"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_run_human(&self, state: &PipelineState) -> String {
        let mut output = String::new();

        let outcome = state.outcome();
        match outcome {
            RunOutcome::Completed => output.push_str("\u{2713} Game Generated\n"),
            RunOutcome::CompletedWithFallback => {
                output.push_str("\u{26A0} Game Generated (Fallback Bundle)\n")
            }
            RunOutcome::Failed => output.push_str("\u{2717} Generation Failed\n"),
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Thread:        {}\n", state.thread_id));
        output.push_str(&format!("Requester:     {}\n", state.requester_id));
        if let Some(ref game_type) = state.game_type {
            output.push_str(&format!("Game Type:     {}\n", game_type));
        }
        if let Some(ref template) = state.selected_template {
            output.push_str(&format!("Template:      {}\n", template));
        }
        if let Some(ref architecture) = state.architecture {
            output.push_str(&format!("Tech Stack:    {}\n", architecture.tech_stack));
        }
        output.push('\n');

        if !state.log.is_empty() {
            output.push_str("Stages:\n");
            for (i, entry) in state.log.iter().enumerate() {
                let connector = if i == state.log.len() - 1 {
                    "\u{2514}\u{2500}"
                } else {
                    "\u{251C}\u{2500}"
                };
                output.push_str(&format!(
                    "{} {} {:<22} {}\n",
                    connector,
                    status_mark(entry.status),
                    entry.step.as_str(),
                    entry.message
                ));
            }
            output.push('\n');
        }

        if let Some(ref files) = state.generated_files {
            output.push_str(&format!("Files ({}):\n", files.len()));
            for (path, content) in files {
                output.push_str(&format!("  {} ({} bytes)\n", path, content.len()));
            }
            output.push('\n');
        }

        if let Some(score) = state.quality_score {
            let passed = state.test_results.iter().filter(|r| r.passed).count();
            output.push_str(&format!(
                "Quality:       {:.0}/100 ({}/{} checks passed)\n",
                score,
                passed,
                state.test_results.len()
            ));
            for result in state.test_results.iter().filter(|r| !r.passed) {
                output.push_str(&format!("  \u{2717} {}: {}\n", result.test_name, result.message));
            }
        }

        if let Some(ref url) = state.deployment_url {
            output.push_str(&format!("URL:           {}\n", url));
        }
        if let Some(ref error) = state.error {
            output.push_str(&format!("Error:         {}\n", error));
        }

        output
    }

    fn format_templates_human(&self, templates: &[TemplateRecord]) -> String {
        let mut output = String::new();

        output.push_str(&format!("Templates ({})\n", templates.len()));
        output.push_str(RULE);
        output.push_str("\n\n");

        for template in templates {
            output.push_str(&format!("{} [{}]\n", template.name, template.id));
            output.push_str(&format!("  {}\n", template.description));
            output.push_str(&format!("  Type:      {}\n", template.game_type));
            output.push_str(&format!("  Stack:     {}\n", template.tech_stack));
            output.push_str(&format!("  Mechanics: {}\n", template.mechanics.join(", ")));
            output.push('\n');
        }

        output
    }
}

fn status_mark(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Completed => "\u{2713}",
        LogStatus::Fallback => "\u{26A0}",
        LogStatus::Failed => "\u{2717}",
    }
}

/// One-line JSON error for `--format json` callers
pub fn json_error(message: &str) -> String {
    json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Stage, TestResult};
    use crate::templates::TemplateCorpus;
    use std::collections::BTreeMap;

    fn finished_state() -> PipelineState {
        let mut state = PipelineState::new("gen_u1_1", "u1", "做一个贪吃蛇游戏");
        state.game_type = Some("贪吃蛇".to_string());
        state.push_log(Stage::RequirementAnalysis, LogStatus::Completed, "需求分析完成");
        state.push_log(Stage::CodeGeneration, LogStatus::Fallback, "使用备用代码");
        let mut files = BTreeMap::new();
        files.insert("index.html".to_string(), "<canvas>".to_string());
        state.generated_files = Some(files);
        state.test_results = vec![TestResult {
            test_name: "HTML结构".to_string(),
            passed: false,
            message: "too short".to_string(),
        }];
        state.quality_score = Some(75.0);
        state.deployment_url = Some("/static/projects/p/index.html".to_string());
        state
    }

    #[test]
    fn test_json_run_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_run(&finished_state()).unwrap();

        let parsed: RunRecord = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.status, RunOutcome::CompletedWithFallback);
        assert_eq!(parsed.quality_score, Some(75.0));
        assert!(output.contains("\"deploymentUrl\""));
    }

    #[test]
    fn test_human_run_format() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_run(&finished_state()).unwrap();

        assert!(output.contains("Fallback Bundle"));
        assert!(output.contains("Game Type:     贪吃蛇"));
        assert!(output.contains("code_generation"));
        assert!(output.contains("index.html (8 bytes)"));
        assert!(output.contains("75/100 (0/1 checks passed)"));
        assert!(output.contains("URL:           /static/projects/p/index.html"));
    }

    #[test]
    fn test_human_failed_run() {
        let mut state = PipelineState::new("t", "u", "x");
        state.fail(Stage::RequirementAnalysis, "Requirement analysis failed: boom");

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_run(&state)
            .unwrap();
        assert!(output.contains("Generation Failed"));
        assert!(output.contains("Error:         Requirement analysis failed: boom"));
    }

    #[test]
    fn test_templates_format() {
        let corpus = TemplateCorpus::with_defaults();

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_templates(corpus.all())
            .unwrap();
        let parsed: Vec<TemplateRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), corpus.len());

        let human = OutputFormatter::new(OutputFormat::Human)
            .format_templates(corpus.all())
            .unwrap();
        assert!(human.contains("[snake_game]"));
    }

    #[test]
    fn test_config_format() {
        let config = GamesmithConfig::default();
        let json = OutputFormatter::new(OutputFormat::Json)
            .format_config(&config)
            .unwrap();
        assert!(json.contains("\"url_prefix\""));
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }
}
