use colorbook_common::{Error, GeneratedImage, Result};
use colorbook_session::{Notice, Outcome, SessionState};
use minijinja::Environment;
use serde::Serialize;

const PAGE_TEMPLATE: &str = include_str!("../templates/page.html");
const PAGE_NAME: &str = "page.html";

#[derive(Debug, Serialize)]
pub struct IdeaOption<'a> {
    pub index: usize,
    pub text: &'a str,
    pub selected: bool,
}

/// Everything the page template needs for one response
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    pub authenticated: bool,
    pub topic: &'a str,
    pub ideas: Vec<IdeaOption<'a>>,
    pub notices: &'a [Notice],
    pub images: &'a [GeneratedImage],
}

impl<'a> PageView<'a> {
    pub fn new(state: &'a SessionState, outcome: &'a Outcome) -> Self {
        let workspace = state.workspace();
        let ideas = workspace
            .map(|workspace| {
                workspace
                    .ideas
                    .iter()
                    .enumerate()
                    .map(|(index, text)| IdeaOption {
                        index,
                        text,
                        selected: workspace.selected == Some(index),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            authenticated: state.is_authenticated(),
            topic: workspace.and_then(|w| w.topic.as_deref()).unwrap_or_default(),
            ideas,
            notices: &outcome.notices,
            images: &outcome.images,
        }
    }
}

/// Renders the single page; the `.html` name turns on autoescaping
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE_NAME, PAGE_TEMPLATE)
            .map_err(|e| Error::Internal(format!("Invalid page template: {}", e)))?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView<'_>) -> Result<String> {
        self.env
            .get_template(PAGE_NAME)
            .and_then(|template| template.render(view))
            .map_err(|e| Error::Internal(format!("Failed to render page: {}", e)))
    }
}
