mod json_store;
mod memory_store;


pub use json_store::JsonIdeaStore;
pub use memory_store::InMemoryIdeaStore;

use async_trait::async_trait;
use colorbook_common::{IdeaMap, Result};

/// Persistent topic -> ideas mapping.
///
/// Keys are used verbatim (case-sensitive). The last `save` for a topic wins
/// and entries are never pruned.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Full mapping; empty when nothing has been stored yet
    async fn load_all(&self) -> Result<IdeaMap>;

    /// Set or overwrite the ideas for one topic, leaving other topics untouched
    async fn save(&self, topic: &str, ideas: &[String]) -> Result<()>;

    /// Ideas stored for a single topic
    async fn get(&self, topic: &str) -> Result<Option<Vec<String>>> {
        Ok(self.load_all().await?.remove(topic))
    }
}
