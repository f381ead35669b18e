//! Triage Store - Biblioteca compartilhada para o histórico criptografado
//!
//! Esta biblioteca fornece:
//! - Modelos de sessões de conversa e mensagens
//! - Armazenamento durável chave/valor (SQLite ou memória)
//! - Envelope de criptografia para o histórico
//! - Histórico de sessões ordenado pela atividade mais recente

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod crypto;
pub mod error;
pub mod migrations;
pub mod models;
pub mod sessions;
pub mod storage;

pub use crypto::{Cipher, Envelope};
pub use error::{StoreError, StoreResult};
pub use models::{ChatSession, Message, Role};
pub use sessions::SessionStore;
pub use storage::{DurableStorage, MemoryStorage, SqliteStorage};

/// Frase de chave padrão da aplicação (substituível por variável de ambiente)
pub const DEFAULT_KEY_PHRASE: &str = "triage-secure-key-v1";

/// Configuração do armazenamento local
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Frase da qual a chave do envelope é derivada
    pub key_phrase: String,
    /// Algoritmo do envelope
    pub cipher: Cipher,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/triage.db".to_string(),
            key_phrase: DEFAULT_KEY_PHRASE.to_string(),
            cipher: Cipher::default(),
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// Lê `TRIAGE_DB_PATH`, `TRIAGE_ENCRYPTION_KEY` e `TRIAGE_CIPHER`,
    /// mantendo o padrão para o que não estiver definido
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("TRIAGE_DB_PATH") {
            config.db_path = path;
        }
        if let Ok(phrase) = std::env::var("TRIAGE_ENCRYPTION_KEY") {
            if !phrase.is_empty() {
                config.key_phrase = phrase;
            }
        }
        if let Ok(cipher) = std::env::var("TRIAGE_CIPHER") {
            config.cipher = cipher.parse().context("TRIAGE_CIPHER inválido")?;
        }

        Ok(config)
    }

    /// Envelope de criptografia correspondente a esta configuração
    pub fn envelope(&self) -> StoreResult<Envelope> {
        Ok(Envelope::from_phrase(&self.key_phrase, self.cipher)?)
    }
}

/// Abre (ou cria) o arquivo SQLite e aplica as migrações pendentes
pub async fn init_store_pool(config: &StoreConfig) -> Result<SqlitePool> {
    let path = Path::new(&config.db_path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Não foi possível criar {}", dir.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Falha ao abrir {}", config.db_path))?;

    migrations::run_migrations(&pool).await?;

    info!("Armazenamento pronto em {}", config.db_path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("test.db");

        let config = StoreConfig {
            db_path: db_path.to_string_lossy().into_owned(),
            max_connections: 2,
            ..StoreConfig::default()
        };

        let pool = init_store_pool(&config).await?;

        let result: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await?;
        assert_eq!(result.0, 1);
        assert!(db_path.exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_history_survives_reopen() -> Result<()> {
        let temp_dir = tempdir()?;
        let config = StoreConfig {
            db_path: temp_dir.path().join("history.db").to_string_lossy().into_owned(),
            cipher: Cipher::ChaCha20Poly1305,
            ..StoreConfig::default()
        };

        let session_id = {
            let storage = Arc::new(SqliteStorage::new(init_store_pool(&config).await?));
            let mut store = SessionStore::load(storage, config.envelope()?).await?;
            let id = store.create_session().await?;
            store.append_message(id, Message::user("Symptoms: cough. ")).await?;
            id
        };

        let storage = Arc::new(SqliteStorage::new(init_store_pool(&config).await?));
        let store = SessionStore::load(storage, config.envelope()?).await?;
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].id, session_id);
        assert_eq!(store.sessions()[0].preview, "Symptoms: cough. ");

        Ok(())
    }
}
