//! JSON ファイル 1 つを丸ごと読み書きするヘルパー
//!
//! - 読み込み: ファイルが無ければ `T::default()`
//! - 書き込み: 同じディレクトリの一時ファイルに書いてから rename（アトミック）
//! - ブロッキング I/O は `spawn_blocking` に逃がす

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::domain::StoreError;

pub(crate) async fn load<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_blocking(&path))
        .await
        .map_err(|err| StoreError::ReadFailed(err.to_string()))?
}

fn load_blocking<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(StoreError::ReadFailed(format!("{}: {err}", path.display()))),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes)
        .map_err(|err| StoreError::ReadFailed(format!("{}: {err}", path.display())))
}

pub(crate) async fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| StoreError::WriteFailed(format!("{}: {err}", path.display())))?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || save_blocking(&path, &bytes))
        .await
        .map_err(|err| StoreError::WriteFailed(err.to_string()))?
}

fn save_blocking(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let fail = |err: &dyn std::fmt::Display| {
        StoreError::WriteFailed(format!("{}: {err}", path.display()))
    };
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(|e| fail(&e))?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| fail(&e))?;
    tmp.write_all(bytes).map_err(|e| fail(&e))?;
    tmp.as_file().sync_all().map_err(|e| fail(&e))?;
    tmp.persist(path).map_err(|e| fail(&e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let value: BTreeMap<String, String> = load(&dir.path().join("absent.json")).await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");
        let mut value = BTreeMap::new();
        value.insert("k".to_string(), "v".to_string());

        save(&path, &value).await.unwrap();
        let loaded: BTreeMap<String, String> = load(&path).await.unwrap();
        assert_eq!(loaded, value);
    }

    #[tokio::test]
    async fn corrupt_file_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: Result<BTreeMap<String, String>, _> = load(&path).await;
        assert!(matches!(result, Err(StoreError::ReadFailed(_))));
    }
}
