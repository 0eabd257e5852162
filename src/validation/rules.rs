use anyhow::Result;
use std::collections::BTreeMap;

/// Generated files plus the entry-file expectations they are checked against
#[derive(Debug, Clone, Copy)]
pub struct GameBundle<'a> {
    pub files: &'a BTreeMap<String, String>,
    pub entry_file: &'a str,
    pub min_entry_length: usize,
}

impl<'a> GameBundle<'a> {
    pub fn entry(&self) -> Option<&'a str> {
        self.files.get(self.entry_file).map(String::as_str)
    }

    fn entry_or_empty(&self) -> &'a str {
        self.entry().unwrap_or("")
    }
}

/// A structural check; `Ok` carries the pass message, `Err` the failure
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, bundle: &GameBundle<'_>) -> Result<String>;
}

pub struct EntryFilePresentRule;

impl ValidationRule for EntryFilePresentRule {
    fn name(&self) -> &'static str {
        "EntryFilePresent"
    }

    fn validate(&self, bundle: &GameBundle<'_>) -> Result<String> {
        if bundle.entry().is_none() {
            anyhow::bail!("{} is missing", bundle.entry_file);
        }
        Ok(format!("{} exists", bundle.entry_file))
    }
}

pub struct EntryFileLengthRule;

impl ValidationRule for EntryFileLengthRule {
    fn name(&self) -> &'static str {
        "EntryFileLength"
    }

    fn validate(&self, bundle: &GameBundle<'_>) -> Result<String> {
        let len = bundle.entry_or_empty().chars().count();
        if len <= bundle.min_entry_length {
            anyhow::bail!(
                "{} is too short ({} chars, need more than {})",
                bundle.entry_file,
                len,
                bundle.min_entry_length
            );
        }
        Ok(format!("{} has {} chars", bundle.entry_file, len))
    }
}

pub struct RenderingSurfaceRule;

impl ValidationRule for RenderingSurfaceRule {
    fn name(&self) -> &'static str {
        "RenderingSurface"
    }

    fn validate(&self, bundle: &GameBundle<'_>) -> Result<String> {
        if !bundle.entry_or_empty().to_lowercase().contains("canvas") {
            anyhow::bail!("{} has no canvas element", bundle.entry_file);
        }
        Ok("canvas rendering surface found".to_string())
    }
}

pub struct InteractionHandlerRule;

impl ValidationRule for InteractionHandlerRule {
    fn name(&self) -> &'static str {
        "InteractionHandler"
    }

    fn validate(&self, bundle: &GameBundle<'_>) -> Result<String> {
        if !bundle.entry_or_empty().contains("addEventListener") {
            anyhow::bail!("{} registers no event listener", bundle.entry_file);
        }
        Ok("event listener registered".to_string())
    }
}
