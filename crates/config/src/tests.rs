#[cfg(test)]
mod tests {
    use crate::config_loader::*;
    use crate::prompt_registry::*;
    use colorbook_common::{Error, Result};
    use std::io::Write;

    #[test]
    fn test_load_default_prompts() -> Result<()> {
        let registry = PromptRegistry::load_defaults()?;

        assert_eq!(registry.list_locales(), vec!["en".to_string(), "pl".to_string()]);

        let default_set = registry.get_default()?;
        assert_eq!(default_set.locale, "pl");
        assert!(default_set.default);
        assert_eq!(default_set.idea_count, 5);
        assert!(default_set.system_prompt.contains("polskim"));

        Ok(())
    }

    #[test]
    fn test_prompt_templates_have_placeholders() -> Result<()> {
        let registry = PromptRegistry::load_defaults()?;

        for locale in registry.list_locales() {
            let set = registry.get(&locale)?;
            assert!(set.ideas_template.contains(TOPIC_PLACEHOLDER));
            assert!(set.ideas_template.contains(COUNT_PLACEHOLDER));
            assert!(set.image_template.contains(IDEA_PLACEHOLDER));
        }

        Ok(())
    }

    #[test]
    fn test_rejects_template_without_topic() {
        let json = r#"{
            "version": "1.0",
            "prompts": [{
                "locale": "pl",
                "name": "Broken",
                "system_prompt": "x",
                "ideas_template": "no placeholder here",
                "image_template": "{idea}",
                "idea_count": 5
            }]
        }"#;

        assert!(matches!(PromptRegistry::load_from_json(json), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_multiple_defaults() {
        let json = r#"{
            "version": "1.0",
            "prompts": [
                {"locale": "a", "name": "A", "system_prompt": "x", "ideas_template": "{topic}",
                 "image_template": "{idea}", "idea_count": 1, "default": true},
                {"locale": "b", "name": "B", "system_prompt": "x", "ideas_template": "{topic}",
                 "image_template": "{idea}", "idea_count": 1, "default": true}
            ]
        }"#;

        assert!(matches!(PromptRegistry::load_from_json(json), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_single_set_becomes_default() -> Result<()> {
        let json = r#"{
            "version": "1.0",
            "prompts": [{"locale": "en", "name": "English", "system_prompt": "x",
                         "ideas_template": "{topic}", "image_template": "{idea}", "idea_count": 3}]
        }"#;

        let registry = PromptRegistry::load_from_json(json)?;
        assert_eq!(registry.get_default()?.locale, "en");
        Ok(())
    }

    #[test]
    fn test_prompt_set_not_found_lists_locales() {
        let registry = PromptRegistry::load_defaults().unwrap();

        match registry.get("de") {
            Err(Error::ConfigError(message)) => assert!(message.ends_with("(available: en, pl)")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_prompts_from_configured_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"version": "1.0", "prompts": [{{"locale": "de", "name": "Deutsch", "system_prompt": "Antworte auf Deutsch.",
                "ideas_template": "{{count}} Ideen zu {{topic}}", "image_template": "Malvorlage: {{idea}}", "idea_count": 4}}]}}"#
        )?;

        let registry = PromptRegistry::load(Some(file.path()))?;
        assert_eq!(registry.list_locales(), vec!["de".to_string()]);
        assert_eq!(registry.get_default()?.idea_count, 4);

        let builtin = PromptRegistry::load(None)?;
        assert_eq!(builtin.get_default()?.locale, "pl");

        Ok(())
    }

    #[test]
    fn test_load_prompts_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PromptRegistry::load(Some(dir.path().join("prompts.json").as_path()));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.openai.text_model, "gpt-4");
        assert_eq!(config.openai.image_model, "dall-e-3");
        assert_eq!(config.openai.image_size, "1024x1024");
        assert_eq!(config.openai.image_quality, "standard");
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.generation.images_per_idea, 1);
        assert_eq!(config.generation.prompts_path, None);
        assert_eq!(config.store.path.to_str(), Some("coloring_ideas.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"server": {{"port": 9000}}, "generation": {{"locale": "en"}}}}"#
        )?;

        let config = ConfigLoader::load(Some(file.path()))?;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.generation.locale, "en");
        assert_eq!(config.generation.images_per_idea, 1);
        assert_eq!(config.openai.text_model, "gpt-4");

        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_values() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"generation": {{"images_per_idea": 0}}}}"#)?;

        let result = ConfigLoader::load(Some(file.path()));
        assert!(matches!(result, Err(Error::ConfigError(_))));

        Ok(())
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load(Some(dir.path().join("missing.json").as_path()));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_prompts_path_from_config_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"generation": {{"prompts_path": "/etc/colorbook/prompts.json"}}}}"#)?;

        let config = ConfigLoader::load(Some(file.path()))?;
        assert_eq!(
            config.generation.prompts_path.as_deref(),
            Some(std::path::Path::new("/etc/colorbook/prompts.json"))
        );
        assert_eq!(config.generation.locale, "pl");

        Ok(())
    }
}
