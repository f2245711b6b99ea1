//! PropertyStore port - 永続 key/value
//!
//! 処理済みメッセージ ID の集合を実行間で保持するために使う。

use async_trait::async_trait;

use crate::domain::StoreError;

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// 値が無ければ `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// 書き込みはアトミックであること（途中で落ちても旧値か新値のどちらか）
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
