//! PropertyStore の実装

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::json_file;
use crate::domain::StoreError;
use crate::ports::PropertyStore;

/// InMemoryProperties はテスト用
///
/// `set_failing(true)` で以降の書き込みを `WriteFailed` にできる。
#[derive(Default)]
pub struct InMemoryProperties {
    values: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PropertyStore for InMemoryProperties {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed(format!("property {key} is read-only")));
        }
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// FileProperties は JSON オブジェクト 1 つ（key -> 文字列）
pub struct FileProperties {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileProperties {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl PropertyStore for FileProperties {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let values: BTreeMap<String, String> = json_file::load(&self.path).await?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values: BTreeMap<String, String> = json_file::load(&self.path).await?;
        values.insert(key.to_string(), value.to_string());
        json_file::save(&self.path, &values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_properties_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");

        let props = FileProperties::new(&path);
        assert_eq!(props.get("k").await.unwrap(), None);
        props.set("k", "[\"a\"]").await.unwrap();
        props.set("other", "x").await.unwrap();

        let reopened = FileProperties::new(&path);
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("[\"a\"]"));
        assert_eq!(reopened.get("other").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn failing_memory_store_rejects_writes() {
        let props = InMemoryProperties::new();
        props.set("k", "1").await.unwrap();
        props.set_failing(true);

        assert!(matches!(props.set("k", "2").await, Err(StoreError::WriteFailed(_))));
        assert_eq!(props.get("k").await.unwrap().as_deref(), Some("1"));
    }
}
