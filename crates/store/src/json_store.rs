use crate::IdeaStore;
use async_trait::async_trait;
use colorbook_common::{Error, IdeaMap, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Idea store backed by a single pretty-printed JSON object on disk.
///
/// Writes go through a sibling temp file that is synced and renamed over the
/// target, so readers see either the old or the new mapping.
pub struct JsonIdeaStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonIdeaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<IdeaMap> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IdeaMap::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(IdeaMap::new());
        }

        match serde_json::from_str::<IdeaMap>(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Idea store is malformed, treating it as empty");
                Ok(IdeaMap::new())
            }
        }
    }

    async fn write_map(&self, map: &IdeaMap) -> Result<()> {
        let bytes = to_pretty_json(map)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.storage_error("create directory for", e))?;
            }
        }

        let tmp_path = self.temp_path()?;
        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.storage_error("create temp file for", e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.storage_error("sync", e))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.storage_error("replace", e))?;

        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| Error::Storage(format!("Invalid store path: {}", self.path.display())))?;
        Ok(self
            .path
            .with_file_name(format!(".{}.tmp", file_name.to_string_lossy())))
    }

    fn storage_error(&self, action: &str, e: std::io::Error) -> Error {
        Error::Storage(format!("Failed to {} {}: {}", action, self.path.display(), e))
    }
}

/// Four-space indentation, non-ASCII written as-is
fn to_pretty_json(map: &IdeaMap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    map.serialize(&mut serializer)?;
    Ok(buf)
}

#[async_trait]
impl IdeaStore for JsonIdeaStore {
    async fn load_all(&self) -> Result<IdeaMap> {
        self.read_map().await
    }

    async fn save(&self, topic: &str, ideas: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        map.insert(topic.to_string(), ideas.to_vec());
        self.write_map(&map).await?;

        debug!(topic, count = ideas.len(), path = %self.path.display(), "Saved ideas");
        Ok(())
    }
}
