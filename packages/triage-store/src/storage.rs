//! Armazenamento durável chave/valor
//!
//! Equivalente ao armazenamento local do navegador: cada chave guarda um
//! único texto. O histórico de sessões (selado) e o token de acesso vivem
//! aqui, em chaves separadas.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreResult;

/// Interface mínima de armazenamento durável
#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Lê o valor da chave, se existir
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Grava (ou substitui) o valor da chave
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a chave; remover uma chave inexistente não é erro
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Armazenamento em SQLite, tabela `kv_store`
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Usa um pool já migrado (ver [`crate::init_store_pool`])
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DurableStorage for SqliteStorage {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!("Chave gravada: {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!("Chave removida: {}", key);
        Ok(())
    }
}

/// Armazenamento em memória, usado em testes e no modo efêmero da CLI
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{init_store_pool, StoreConfig};
    use tempfile::tempdir;

    async fn exercise(storage: &dyn DurableStorage) -> StoreResult<()> {
        assert_eq!(storage.get("auth_token").await?, None);

        storage.set("auth_token", "abc").await?;
        assert_eq!(storage.get("auth_token").await?.as_deref(), Some("abc"));

        storage.set("auth_token", "def").await?;
        assert_eq!(storage.get("auth_token").await?.as_deref(), Some("def"));

        storage.remove("auth_token").await?;
        assert_eq!(storage.get("auth_token").await?, None);

        // Remover de novo não falha
        storage.remove("auth_token").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_storage() -> StoreResult<()> {
        exercise(&MemoryStorage::new()).await
    }

    #[tokio::test]
    async fn test_sqlite_storage() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let config = StoreConfig {
            db_path: temp_dir.path().join("kv.db").to_string_lossy().into_owned(),
            ..StoreConfig::default()
        };

        let pool = init_store_pool(&config).await?;
        exercise(&SqliteStorage::new(pool)).await?;
        Ok(())
    }
}
