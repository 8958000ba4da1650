use crate::models::WatchedFile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One `watched_files` entry as found on disk. Older files stored bare paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Current(WatchedFile),
    Legacy(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    watched_files: Vec<StoredEntry>,
    /// Other settings sharing the file, written back untouched.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RegistryDocument {
    fn has_legacy_entries(&self) -> bool {
        self.watched_files
            .iter()
            .any(|entry| matches!(entry, StoredEntry::Legacy(_)))
    }

    fn files(&self) -> Vec<WatchedFile> {
        self.watched_files
            .iter()
            .map(|entry| match entry {
                StoredEntry::Current(file) => file.clone(),
                StoredEntry::Legacy(path) => WatchedFile::from_path(path),
            })
            .collect()
    }

    fn set_files(&mut self, files: Vec<WatchedFile>) {
        self.watched_files = files.into_iter().map(StoredEntry::Current).collect();
    }
}

/// JSON-file registry of watched log files.
///
/// Every read-modify-write holds `write_lock`, so concurrent add/remove
/// requests are applied one after the other. Saves go to a sibling temp file
/// that is then renamed over the registry.
pub struct Registry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Registry {
    /// Open the registry, rewriting a legacy path-list file in the current
    /// schema.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let registry = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };
        info!("Using registry file {}", registry.path.display());

        let guard = registry.write_lock.lock().await;
        let mut doc = registry.load_or_default().await;
        if doc.has_legacy_entries() {
            info!("Migrating legacy watched_files entries to objects");
            let files = doc.files();
            doc.set_files(files);
            if let Err(e) = registry.save(&doc).await {
                error!("Failed to save migrated registry: {}", e);
            }
        }
        drop(guard);

        registry
    }

    /// Watched files, or an empty list if the registry cannot be read.
    pub async fn list(&self) -> Vec<WatchedFile> {
        self.load_or_default().await.files()
    }

    /// Append `full_path` unless it is already watched. Returns whether it
    /// was added.
    pub async fn add(&self, full_path: &str) -> Result<bool, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_or_default().await;
        let mut files = doc.files();

        if files.iter().any(|f| f.full_path == full_path) {
            debug!("{} is already watched", full_path);
            return Ok(false);
        }

        files.push(WatchedFile::from_path(full_path));
        doc.set_files(files);
        self.save(&doc).await?;
        info!("Now watching {}", full_path);
        Ok(true)
    }

    /// Remove `full_path`. Returns whether an entry was removed; removing an
    /// unknown path is a no-op.
    pub async fn remove(&self, full_path: &str) -> Result<bool, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load_or_default().await;
        let mut files = doc.files();

        let before = files.len();
        files.retain(|f| f.full_path != full_path);
        if files.len() == before {
            debug!("{} was not watched", full_path);
            return Ok(false);
        }

        doc.set_files(files);
        self.save(&doc).await?;
        info!("Stopped watching {}", full_path);
        Ok(true)
    }

    async fn load(&self) -> Result<RegistryDocument, RegistryError> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RegistryDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_or_default(&self) -> RegistryDocument {
        self.load().await.unwrap_or_else(|e| {
            error!("Error loading registry {}: {}", self.path.display(), e);
            RegistryDocument::default()
        })
    }

    async fn save(&self, doc: &RegistryDocument) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(doc)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Saved registry {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        let registry = Registry::open(&path).await;
        assert!(registry.list().await.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        let registry = Registry::open(&path).await;

        assert!(registry.add("/var/log/app.log").await.unwrap());
        assert!(!registry.add("/var/log/app.log").await.unwrap());

        let reopened = Registry::open(&path).await;
        assert_eq!(
            reopened.list().await,
            vec![WatchedFile {
                short_name: "app.log".to_string(),
                full_path: "/var/log/app.log".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path().join("files.json")).await;
        registry.add("/var/log/a.log").await.unwrap();

        assert!(!registry.remove("/var/log/b.log").await.unwrap());
        assert!(registry.remove("/var/log/a.log").await.unwrap());
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_schema_is_migrated_and_extra_keys_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        let legacy = json!({
            "watched_files": ["/var/log/a.log", "/srv/b.log"],
            "rimu_log_file": "/tmp/rimu.log"
        });
        fs::write(&path, legacy.to_string()).await.unwrap();

        let registry = Registry::open(&path).await;
        assert_eq!(
            read_json(&path).await,
            json!({
                "watched_files": [
                    {"short_name": "a.log", "full_path": "/var/log/a.log"},
                    {"short_name": "b.log", "full_path": "/srv/b.log"}
                ],
                "rimu_log_file": "/tmp/rimu.log"
            })
        );

        registry.add("/srv/c.log").await.unwrap();
        let saved = read_json(&path).await;
        assert_eq!(saved["rimu_log_file"], "/tmp/rimu.log");
        assert_eq!(saved["watched_files"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        fs::write(&path, "{ not json").await.unwrap();

        let registry = Registry::open(&path).await;
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let registry = std::sync::Arc::new(Registry::open(dir.path().join("files.json")).await);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.add(&format!("/var/log/{i}.log")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(registry.list().await.len(), 8);
    }
}
