use crate::IdeaStore;
use async_trait::async_trait;
use colorbook_common::{IdeaMap, Result};
use tokio::sync::RwLock;

/// Process-local store with the same semantics as the JSON file
#[derive(Default)]
pub struct InMemoryIdeaStore {
    entries: RwLock<IdeaMap>,
}

impl InMemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: IdeaMap) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl IdeaStore for InMemoryIdeaStore {
    async fn load_all(&self) -> Result<IdeaMap> {
        Ok(self.entries.read().await.clone())
    }

    async fn save(&self, topic: &str, ideas: &[String]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(topic.to_string(), ideas.to_vec());
        Ok(())
    }

    async fn get(&self, topic: &str) -> Result<Option<Vec<String>>> {
        Ok(self.entries.read().await.get(topic).cloned())
    }
}
