//! Contexto de credenciais do cliente
//!
//! Guarda o token de acesso em memória e o espelha no armazenamento
//! durável. É injetado no [`crate::DiagnosisClient`]; clones compartilham o
//! mesmo token.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use triage_store::{DurableStorage, StoreResult};

/// Chave do token no armazenamento durável (texto puro)
pub const TOKEN_KEY: &str = "auth_token";

#[derive(Clone)]
pub struct CredentialContext {
    token: Arc<RwLock<Option<String>>>,
    storage: Option<Arc<dyn DurableStorage>>,
}

impl CredentialContext {
    /// Contexto sem token e sem persistência (modo anônimo)
    pub fn anonymous() -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            storage: None,
        }
    }

    /// Restaura o token salvo, se houver
    pub async fn restore(storage: Arc<dyn DurableStorage>) -> StoreResult<Self> {
        let token = storage.get(TOKEN_KEY).await?.filter(|t| !t.is_empty());
        if token.is_some() {
            info!("Token de acesso restaurado");
        }

        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            storage: Some(storage),
        })
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Guarda o token em memória e no armazenamento
    pub async fn save(&self, token: String) -> StoreResult<()> {
        if let Some(storage) = &self.storage {
            storage.set(TOKEN_KEY, &token).await?;
        }
        *self.token.write().await = Some(token);

        debug!("Token de acesso atualizado");
        Ok(())
    }

    /// Remove o token da memória e do armazenamento
    pub async fn clear(&self) -> StoreResult<()> {
        *self.token.write().await = None;
        if let Some(storage) = &self.storage {
            storage.remove(TOKEN_KEY).await?;
        }

        debug!("Token de acesso removido");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialContext")
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}
