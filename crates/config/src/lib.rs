mod config_loader;
mod prompt_registry;

#[cfg(test)]
mod tests;

pub use config_loader::{
    AppConfig, ConfigLoader, GenerationConfig, OpenAiConfig, ServerConfig, StoreConfig,
    CONFIG_PATH_ENV,
};
pub use prompt_registry::{
    PromptRegistry, PromptRegistryData, PromptSet, COUNT_PLACEHOLDER, IDEA_PLACEHOLDER,
    TOPIC_PLACEHOLDER,
};
