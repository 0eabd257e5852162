use crate::pipeline::context::PipelineContext;
use crate::pipeline::deploy::{deployment_url, project_dir_name, write_project, DeploymentError};
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::state::{LogStatus, PipelineState, Stage};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

pub struct DeploymentPhase;

#[async_trait]
impl StagePhase for DeploymentPhase {
    fn stage(&self) -> Stage {
        Stage::Deployment
    }

    async fn execute(&self, context: &PipelineContext, mut state: PipelineState) -> PipelineState {
        let config = &context.config;
        let dir_name = project_dir_name(&state.requester_id, Utc::now());

        let result = match state.generated_files.as_ref() {
            Some(files) => write_project(
                context.file_system.as_ref(),
                &config.projects_dir,
                &dir_name,
                files,
                &config.entry_file,
            ),
            None => Err(DeploymentError::NothingToDeploy),
        };

        match result {
            Ok(project_dir) => {
                let url = deployment_url(&config.url_prefix, &dir_name, &config.entry_file);
                info!(dir = %project_dir.display(), url = %url, "Deployed");
                state.push_log(self.stage(), LogStatus::Completed, format!("Deployed: {}", url));
                state.deployment_url = Some(url);
            }
            Err(e) => {
                error!("Deployment failed: {}", e);
                state.fail(self.stage(), format!("Deployment failed: {}", e));
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::llm::MockLLMClient;
    use crate::pipeline::config::PipelineConfig;
    use crate::pipeline::phases::fallback::reference_bundle;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_deploys_to_namespaced_dir() {
        let temp = TempDir::new().unwrap();
        let config = PipelineConfig::default().with_projects_dir(temp.path());
        let ctx = PipelineContext::minimal(Arc::new(MockLLMClient::new()), config);

        let mut state = PipelineState::new("t", "user-7", "x");
        state.generated_files = Some(reference_bundle("index.html"));
        let state = DeploymentPhase.execute(&ctx, state).await;

        let url = state.deployment_url.clone().unwrap();
        assert!(url.starts_with("/static/projects/project_user-7_"));
        assert!(url.ends_with("/index.html"));
        assert!(state.error.is_none());

        let dir_name = url.split('/').nth(3).unwrap();
        let html = std::fs::read_to_string(temp.path().join(dir_name).join("index.html")).unwrap();
        assert_eq!(html, reference_bundle("index.html")["index.html"]);
    }

    #[tokio::test]
    async fn test_no_files_fails() {
        let ctx = PipelineContext::minimal(Arc::new(MockLLMClient::new()), PipelineConfig::default())
            .with_file_system(Arc::new(MockFileSystem::new()));

        let state = DeploymentPhase
            .execute(&ctx, PipelineState::new("t", "u1", "x"))
            .await;
        assert!(state.deployment_url.is_none());
        assert_eq!(state.log[0].status, LogStatus::Failed);
        assert!(state.error.as_deref().unwrap().contains("no generated files"));
    }

    #[tokio::test]
    async fn test_write_error_leaves_url_unset() {
        let fs = Arc::new(MockFileSystem::new());
        fs.fail_writes_to("index.html");
        let ctx = PipelineContext::minimal(Arc::new(MockLLMClient::new()), PipelineConfig::default())
            .with_file_system(fs);

        let mut state = PipelineState::new("t", "u1", "x");
        state.generated_files = Some(BTreeMap::from([(
            "index.html".to_string(),
            "<canvas>".to_string(),
        )]));
        let state = DeploymentPhase.execute(&ctx, state).await;

        assert!(state.deployment_url.is_none());
        assert!(state.error.as_deref().unwrap().starts_with("Deployment failed"));
    }
}
