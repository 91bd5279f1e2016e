use colorbook_common::{Error, Message, Result};
use colorbook_config::{PromptSet, COUNT_PLACEHOLDER, IDEA_PLACEHOLDER, TOPIC_PLACEHOLDER};

/// Prompt formatting and response cleanup for the coloring flow
pub struct PromptEngine;

impl PromptEngine {
    /// System persona followed by the topic instruction
    pub fn ideas_messages(prompts: &PromptSet, topic: &str) -> Vec<Message> {
        let instruction = prompts
            .ideas_template
            .replace(COUNT_PLACEHOLDER, &prompts.idea_count.to_string())
            .replace(TOPIC_PLACEHOLDER, topic);

        vec![
            Message::system(prompts.system_prompt.clone()),
            Message::user(instruction),
        ]
    }

    pub fn image_prompt(prompts: &PromptSet, idea: &str) -> String {
        prompts.image_template.replace(IDEA_PLACEHOLDER, idea)
    }

    /// Split a completion into one idea per non-blank line.
    ///
    /// Lines are kept verbatim apart from surrounding whitespace, so any
    /// numbering the model adds stays part of the idea. The count is not
    /// checked against the requested number.
    pub fn parse_ideas(raw: &str) -> Result<Vec<String>> {
        let ideas: Vec<String> = raw
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if ideas.is_empty() {
            return Err(Error::MalformedResponse("model returned no ideas".into()));
        }
        Ok(ideas)
    }
}
