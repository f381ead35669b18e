//! Definições de erro para a biblioteca triage-store
//!
//! Este módulo define os tipos de erro usados pelo armazenamento durável
//! e pelo histórico de sessões

use thiserror::Error;

use crate::crypto::CryptoError;

/// Resultado padrão das operações de armazenamento
pub type StoreResult<T> = Result<T, StoreError>;

/// Erros específicos para operações de armazenamento
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Erro de conexão com armazenamento: {0}")]
    ConnectionError(String),

    #[error("Erro de consulta: {0}")]
    QueryError(String),

    #[error("Erro de serialização: {0}")]
    SerializationError(String),

    #[error("Erro de criptografia: {0}")]
    CryptoError(#[from] CryptoError),

    #[error("Erro interno: {0}")]
    InternalError(String),
}

/// Falhas de E/S e do pool viram erro de conexão; o resto, de consulta
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => StoreError::QueryError(db.message().to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::QueryError(format!("coluna {} ilegível: {}", index, source))
            }
            sqlx::Error::Io(e) => StoreError::ConnectionError(e.to_string()),
            sqlx::Error::Configuration(e) => StoreError::ConnectionError(e.to_string()),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                StoreError::ConnectionError(error.to_string())
            }
            other => StoreError::InternalError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::SerializationError(error.to_string())
    }
}
