use crate::pipeline::state::TestResult;
use crate::validation::rules::{
    EntryFileLengthRule, EntryFilePresentRule, GameBundle, InteractionHandlerRule,
    RenderingSurfaceRule, ValidationRule,
};

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Runs every rule; never stops at the first failure
    pub fn validate(&self, bundle: &GameBundle<'_>) -> Vec<TestResult> {
        self.rules
            .iter()
            .map(|rule| match rule.validate(bundle) {
                Ok(message) => TestResult {
                    test_name: rule.name().to_string(),
                    passed: true,
                    message,
                },
                Err(e) => TestResult {
                    test_name: rule.name().to_string(),
                    passed: false,
                    message: e.to_string(),
                },
            })
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(EntryFilePresentRule),
                Box::new(EntryFileLengthRule),
                Box::new(RenderingSurfaceRule),
                Box::new(InteractionHandlerRule),
            ],
        }
    }
}

/// `100 × passed / total`, or 0 when there are no results
pub fn quality_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    100.0 * passed as f64 / results.len() as f64
}
