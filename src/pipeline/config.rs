use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub temperature: f32,
    pub analysis_max_tokens: u32,
    pub design_max_tokens: u32,
    pub code_max_tokens: u32,
    /// Landing document every deployment must contain
    pub entry_file: String,
    /// Entry file must be longer than this to pass validation
    pub min_entry_length: usize,
    pub projects_dir: PathBuf,
    pub url_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            analysis_max_tokens: 1024,
            design_max_tokens: 1024,
            code_max_tokens: 8192,
            entry_file: "index.html".to_string(),
            min_entry_length: 1000,
            projects_dir: PathBuf::from("./generated_projects"),
            url_prefix: "/static/projects".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_code_max_tokens(mut self, max_tokens: u32) -> Self {
        self.code_max_tokens = max_tokens;
        self
    }

    pub fn with_projects_dir(mut self, projects_dir: impl Into<PathBuf>) -> Self {
        self.projects_dir = projects_dir.into();
        self
    }

    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = url_prefix.into();
        self
    }

    pub fn with_min_entry_length(mut self, min_entry_length: usize) -> Self {
        self.min_entry_length = min_entry_length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.entry_file, "index.html");
        assert_eq!(config.min_entry_length, 1000);
        assert_eq!(config.url_prefix, "/static/projects");
        assert_eq!(config.projects_dir, PathBuf::from("./generated_projects"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_temperature(0.2)
            .with_code_max_tokens(4096)
            .with_projects_dir("/tmp/out")
            .with_url_prefix("/games")
            .with_min_entry_length(10);

        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.code_max_tokens, 4096);
        assert_eq!(config.projects_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.url_prefix, "/games");
        assert_eq!(config.min_entry_length, 10);
    }
}
