use colorbook_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that may point at a config file
pub const CONFIG_PATH_ENV: &str = "COLORBOOK_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Generative service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// Idea and image generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Prompt set to use from the prompt registry
    pub locale: String,
    /// Prompt registry file replacing the built-in sets
    pub prompts_path: Option<PathBuf>,
    pub images_per_idea: usize,
}

/// Idea store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            text_model: "gpt-4".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            locale: "pl".to_string(),
            prompts_path: None,
            images_per_idea: 1,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("coloring_ideas.json"),
        }
    }
}

impl AppConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.openai.base_url.trim().is_empty() {
            return Err(Error::ConfigError("openai.base_url cannot be empty".into()));
        }
        if self.openai.api_key_env.trim().is_empty() {
            return Err(Error::ConfigError("openai.api_key_env cannot be empty".into()));
        }
        if self.generation.images_per_idea == 0 {
            return Err(Error::ConfigError("generation.images_per_idea must be at least 1".into()));
        }
        if self.openai.request_timeout_secs == 0 {
            return Err(Error::ConfigError("openai.request_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_file(path);
            }
            return Err(Error::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load(Some(Path::new(&env_path)));
        }

        // Check default locations
        let default_paths = vec![
            PathBuf::from("colorbook.json"),
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("colorbook/config.json"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_file(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(AppConfig::default())
    }

    fn load_file(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
