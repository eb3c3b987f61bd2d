use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::SNAPSHOT_VERSION;
use crate::error::{CatalogError, Result};
use crate::pipeline::processing::matcher::{BrandEntry, KnowledgeBase};

/// Remote blob storage used for the knowledge base snapshot.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the bytes stored under `key`; [`CatalogError::ObjectNotFound`] if absent.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;
    /// Store `bytes` under `key`, replacing any previous object. Returns its URL.
    async fn store(&self, bytes: Vec<u8>, key: &str) -> Result<String>;
}

/// Durable home of the learned brand → model mapping.
#[async_trait]
pub trait KnowledgeBaseStore: Send + Sync {
    async fn load(&self) -> Result<KnowledgeBase>;
    async fn save(&self, knowledge_base: &KnowledgeBase) -> Result<()>;
}

/// Object store rooted at a local directory
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(CatalogError::Config(format!("Invalid object key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CatalogError::ObjectNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write next to the target and rename so readers never see a partial file
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("file://{}", path.display()))
    }
}

/// In-memory object store for development/testing
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::ObjectNotFound(key.to_string()))
    }

    async fn store(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        self.objects.lock().await.insert(key.to_string(), bytes);
        Ok(format!("memory://{}", key))
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    brands: &'a [BrandEntry],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[allow(dead_code)]
    saved_at: Option<DateTime<Utc>>,
    brands: Vec<BrandEntry>,
}

/// [`KnowledgeBaseStore`] keeping a versioned JSON snapshot in an [`ObjectStore`].
///
/// Snapshots look like `{"version": 1, "saved_at": ..., "brands": [{"brand":
/// "sony", "models": ["xperia"]}]}`. A plain `{"sony": ["xperia"]}` object is
/// also accepted on load, for seeding a fresh deployment by hand.
pub struct SnapshotStore<O> {
    objects: O,
    key: String,
}

impl<O: ObjectStore> SnapshotStore<O> {
    pub fn new(objects: O, key: impl Into<String>) -> Self {
        Self { objects, key: key.into() }
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    fn decode(&self, bytes: &[u8]) -> Result<KnowledgeBase> {
        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| CatalogError::malformed("knowledge base snapshot", &self.key, e.to_string()))?;

        let Value::Object(map) = doc else {
            return Err(CatalogError::malformed(
                "knowledge base snapshot",
                &self.key,
                "expected a JSON object",
            ));
        };

        if map.get("version").map_or(false, Value::is_number) {
            let snapshot: Snapshot = serde_json::from_value(Value::Object(map))
                .map_err(|e| CatalogError::malformed("knowledge base snapshot", &self.key, e.to_string()))?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(CatalogError::UnsupportedSnapshot(snapshot.version));
            }
            return Ok(KnowledgeBase::from_entries(
                snapshot.brands.into_iter().map(|e| (e.brand, e.models)),
            ));
        }

        let mut entries = Vec::with_capacity(map.len());
        for (brand, models) in map {
            let models: Vec<String> = serde_json::from_value(models).map_err(|e| {
                CatalogError::malformed(
                    "knowledge base snapshot",
                    &self.key,
                    format!("models of '{}': {}", brand, e),
                )
            })?;
            entries.push((brand, models));
        }
        Ok(KnowledgeBase::from_entries(entries))
    }
}

#[async_trait]
impl<O: ObjectStore> KnowledgeBaseStore for SnapshotStore<O> {
    async fn load(&self) -> Result<KnowledgeBase> {
        let bytes = match self.objects.fetch(&self.key).await {
            Ok(bytes) => bytes,
            Err(CatalogError::ObjectNotFound(location)) => {
                info!("No knowledge base snapshot at {}, starting empty", location);
                return Ok(KnowledgeBase::new());
            }
            Err(e) => return Err(e),
        };

        let knowledge_base = self.decode(&bytes)?;
        info!(
            "Loaded knowledge base '{}' ({} brands, {} models)",
            self.key,
            knowledge_base.brand_count(),
            knowledge_base.model_count()
        );
        Ok(knowledge_base)
    }

    async fn save(&self, knowledge_base: &KnowledgeBase) -> Result<()> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            brands: knowledge_base.entries(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        let url = self.objects.store(bytes, &self.key).await?;
        info!(
            "Saved knowledge base to {} ({} brands, {} models)",
            url,
            knowledge_base.brand_count(),
            knowledge_base.model_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.insert_brand("sony");
        kb.insert_model("sony", "xperia z");
        kb.insert_model("sony", "bravia");
        kb.insert_brand("lg");
        kb.insert_brand("acer");
        kb.insert_model("acer", "aspire 3");
        kb
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order() {
        let store = SnapshotStore::new(MemoryObjectStore::new(), "kb.json");
        let kb = sample();

        store.save(&kb).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, kb);
        let brands: Vec<&str> = loaded.brands().collect();
        assert_eq!(brands, vec!["sony", "lg", "acer"]);
        assert_eq!(
            loaded.models("sony"),
            Some(&["xperia z".to_string(), "bravia".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let store = SnapshotStore::new(MemoryObjectStore::new(), "kb.json");
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_format_is_accepted() {
        let objects = MemoryObjectStore::new();
        objects
            .store(br#"{"Samsung": ["Galaxy A10", "galaxy a10"], "bgh": []}"#.to_vec(), "kb.json")
            .await
            .unwrap();

        let kb = SnapshotStore::new(objects, "kb.json").load().await.unwrap();
        let brands: Vec<&str> = kb.brands().collect();
        assert_eq!(brands, vec!["samsung", "bgh"]);
        assert_eq!(kb.models("samsung"), Some(&["galaxy a10".to_string()][..]));
    }

    #[tokio::test]
    async fn test_bad_snapshots_are_errors() {
        let objects = MemoryObjectStore::new();
        let store = SnapshotStore::new(objects.clone(), "kb.json");

        objects.store(b"not json".to_vec(), "kb.json").await.unwrap();
        assert!(matches!(store.load().await, Err(CatalogError::MalformedDocument { .. })));

        objects
            .store(br#"{"version": 99, "brands": []}"#.to_vec(), "kb.json")
            .await
            .unwrap();
        assert!(matches!(store.load().await, Err(CatalogError::UnsupportedSnapshot(99))));

        objects.store(br#"{"sony": "xperia"}"#.to_vec(), "kb.json").await.unwrap();
        assert!(matches!(store.load().await, Err(CatalogError::MalformedDocument { .. })));
    }

    #[tokio::test]
    async fn test_fs_store_writes_atomically_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let objects = FsObjectStore::new(dir.path().join("kb"));
        let store = SnapshotStore::new(objects, "nested/knowledge_base.json");

        store.save(&sample()).await.unwrap();
        store.save(&sample()).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("kb/nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_fs_store_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let objects = FsObjectStore::new(dir.path());
        assert!(matches!(objects.fetch("../etc/passwd").await, Err(CatalogError::Config(_))));
        assert!(matches!(objects.fetch("missing.json").await, Err(CatalogError::ObjectNotFound(_))));
    }
}
