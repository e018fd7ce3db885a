// Cache store implementations - One JSON document per key
use crate::application::dashboard_cache::CacheStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Stores each slot as `<dir>/<key>.json`. The store never expires anything.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys carry user ids, so anything outside `[A-Za-z0-9_-]` is escaped.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    stem
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Non UTF-8 contents are as good as corrupt JSON: hand back
            // something that will fail to parse.
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        // Write-then-rename so a reader never sees a half-written slot.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    slots: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryCacheStore {
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_escapes_separators() {
        assert_eq!(file_stem("admin-dashboard"), "admin-dashboard");
        assert_eq!(file_stem("admin-dashboard:u7"), "admin-dashboard%3Au7");
        assert_eq!(file_stem("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("nested"));

        assert_eq!(store.load("admin-dashboard").await.unwrap(), None);

        store.save("admin-dashboard", r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            store.load("admin-dashboard").await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );

        store.save("admin-dashboard", r#"{"a":2}"#).await.unwrap();
        assert_eq!(
            store.load("admin-dashboard").await.unwrap().as_deref(),
            Some(r#"{"a":2}"#)
        );

        store.remove("admin-dashboard").await.unwrap();
        assert_eq!(store.load("admin-dashboard").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());
        store.remove("never-written").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_keeps_users_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        store.save("admin-dashboard:u1", "one").await.unwrap();
        store.save("admin-dashboard:u2", "two").await.unwrap();

        assert_eq!(store.load("admin-dashboard:u1").await.unwrap().as_deref(), Some("one"));
        assert_eq!(store.load("admin-dashboard:u2").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCacheStore::default();
        assert!(store.is_empty());
        store.save("k", "v").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }
}
