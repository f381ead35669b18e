//! Tipos de erro do cliente de diagnóstico
//!
//! Nenhum destes erros é fatal: a camada de apresentação converte cada um
//! em mensagem visível ou em estado vazio.

use thiserror::Error;
use triage_store::StoreError;

/// Resultado padrão das chamadas ao serviço
pub type ClientResult<T> = Result<T, ClientError>;

/// Erros de transporte, decodificação e autenticação
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Erro de rede: {0}")]
    Network(String),

    #[error("Resposta HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Resposta inválida: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Erro de configuração: {0}")]
    Configuration(String),

    #[error("Erro de armazenamento: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Falhas de transporte: a conversa segue com mensagem de fallback
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Http { .. } | ClientError::InvalidResponse(_)
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ClientError::Network("recusado".into()).is_transport_error());
        assert!(ClientError::Http { status: 500, body: String::new() }.is_transport_error());
        assert!(!ClientError::auth("Invalid credentials").is_transport_error());
        assert!(ClientError::auth("Invalid credentials").is_auth_error());
    }

    #[test]
    fn test_auth_error_displays_server_message() {
        assert_eq!(
            ClientError::auth("Email already registered").to_string(),
            "Email already registered"
        );
        assert_eq!(
            ClientError::Http { status: 502, body: "bad gateway".into() }.to_string(),
            "Resposta HTTP 502: bad gateway"
        );
    }
}
