use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use colorbook_common::{Result, Error};
use tracing::info;

pub const TOPIC_PLACEHOLDER: &str = "{topic}";
pub const IDEA_PLACEHOLDER: &str = "{idea}";
pub const COUNT_PLACEHOLDER: &str = "{count}";

/// Prompts for one output language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptSet {
    /// Unique identifier, e.g. "pl"
    pub locale: String,
    /// Display name
    pub name: String,
    /// Persona and language instruction sent as the system message
    pub system_prompt: String,
    /// User instruction; must contain `{topic}`, may contain `{count}`
    pub ideas_template: String,
    /// Image prompt; must contain `{idea}`
    pub image_template: String,
    /// Number of ideas requested per topic
    pub idea_count: usize,
    /// Whether this is the default prompt set
    #[serde(default)]
    pub default: bool,
}

impl PromptSet {
    fn validate(&self) -> Result<()> {
        if self.locale.trim().is_empty() {
            return Err(Error::ConfigError("Prompt set with empty locale".into()));
        }
        if !self.ideas_template.contains(TOPIC_PLACEHOLDER) {
            return Err(Error::ConfigError(format!(
                "Prompt set {}: ideas_template must contain {}",
                self.locale, TOPIC_PLACEHOLDER
            )));
        }
        if !self.image_template.contains(IDEA_PLACEHOLDER) {
            return Err(Error::ConfigError(format!(
                "Prompt set {}: image_template must contain {}",
                self.locale, IDEA_PLACEHOLDER
            )));
        }
        if self.idea_count == 0 {
            return Err(Error::ConfigError(format!(
                "Prompt set {}: idea_count must be at least 1",
                self.locale
            )));
        }
        Ok(())
    }
}

/// Registry file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRegistryData {
    pub version: String,
    pub prompts: Vec<PromptSet>,
}

/// Prompt sets keyed by locale
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    sets: HashMap<String, PromptSet>,
    default_locale: Option<String>,
}

impl PromptRegistry {
    /// Load registry from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_json(&content)
    }

    /// Load registry from JSON string
    pub fn load_from_json(json: &str) -> Result<Self> {
        let data: PromptRegistryData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Load the built-in prompt sets
    pub fn load_defaults() -> Result<Self> {
        let json = include_str!("default_prompts.json");
        Self::load_from_json(json)
    }

    /// Prompt file from the configuration, or the built-in sets
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!("Loading prompt sets from {}", path.display());
                Self::load_from_file(path)
            }
            None => Self::load_defaults(),
        }
    }

    fn from_data(data: PromptRegistryData) -> Result<Self> {
        let mut sets = HashMap::new();
        let mut default_locale = None;

        for set in data.prompts {
            set.validate()?;
            if set.default {
                if default_locale.is_some() {
                    return Err(Error::ConfigError("Multiple default prompt sets specified".into()));
                }
                default_locale = Some(set.locale.clone());
            }
            if sets.contains_key(&set.locale) {
                return Err(Error::ConfigError(format!("Duplicate prompt locale: {}", set.locale)));
            }
            sets.insert(set.locale.clone(), set);
        }

        if default_locale.is_none() && sets.len() == 1 {
            default_locale = sets.keys().next().cloned();
        }

        Ok(Self { sets, default_locale })
    }

    /// Get a prompt set by locale
    pub fn get(&self, locale: &str) -> Result<&PromptSet> {
        self.sets
            .get(locale)
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "Prompt set not found: {} (available: {})",
                    locale,
                    self.list_locales().join(", ")
                ))
            })
    }

    /// Get the default prompt set
    pub fn get_default(&self) -> Result<&PromptSet> {
        let locale = self.default_locale
            .as_ref()
            .ok_or_else(|| Error::ConfigError("No default prompt set configured".into()))?;
        self.get(locale)
    }

    /// List all available locales, sorted
    pub fn list_locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.sets.keys().cloned().collect();
        locales.sort();
        locales
    }
}
