//! Histórico de sessões de conversa
//!
//! Mantém a lista ordenada de sessões (a mais recente primeiro) e grava a
//! lista inteira, selada, a cada alteração.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::crypto::Envelope;
use crate::error::StoreResult;
use crate::models::{ChatSession, Message};
use crate::storage::DurableStorage;

/// Chave do histórico no armazenamento durável
pub const HISTORY_KEY: &str = "triage_chat_history";

/// Lista de sessões com persistência criptografada
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    envelope: Envelope,
    sessions: Vec<ChatSession>,
    current: Option<Uuid>,
}

impl SessionStore {
    /// Carrega o histórico salvo.
    ///
    /// Blob ausente, corrompido ou selado com outra chave resulta em
    /// histórico vazio. Só falhas de leitura do armazenamento são erro.
    pub async fn load(storage: Arc<dyn DurableStorage>, envelope: Envelope) -> StoreResult<Self> {
        let sessions = match storage.get(HISTORY_KEY).await? {
            Some(blob) => decode_history(&envelope, &blob),
            None => Vec::new(),
        };

        info!("Histórico carregado: {} sessões", sessions.len());
        Ok(Self {
            storage,
            envelope,
            sessions,
            current: None,
        })
    }

    /// Sessões, da mais recente para a mais antiga
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn get(&self, id: Uuid) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn current_session_id(&self) -> Option<Uuid> {
        self.current
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current.and_then(|id| self.get(id))
    }

    /// Torna a sessão ativa; id desconhecido retorna `false`
    pub fn select(&mut self, id: Uuid) -> bool {
        if self.get(id).is_some() {
            self.current = Some(id);
            true
        } else {
            debug!("Sessão desconhecida ignorada: {}", id);
            false
        }
    }

    /// Cria uma sessão vazia no topo da lista e a torna ativa
    pub async fn create_session(&mut self) -> StoreResult<Uuid> {
        let session = ChatSession::new(self.next_timestamp());
        let id = session.id;

        self.sessions.insert(0, session);
        self.current = Some(id);
        self.persist().await?;

        info!("Nova sessão criada: {}", id);
        Ok(id)
    }

    /// Garante uma sessão ativa: retoma a mais recente ou cria uma nova
    pub async fn ensure_active(&mut self) -> StoreResult<Uuid> {
        if let Some(id) = self.current {
            return Ok(id);
        }

        match self.sessions.first().map(|s| s.id) {
            Some(id) => {
                self.current = Some(id);
                Ok(id)
            }
            None => self.create_session().await,
        }
    }

    /// Anexa a mensagem à sessão e move a sessão para o topo.
    ///
    /// Retorna `false` (sem gravar nada) se a sessão não existe.
    pub async fn append_message(&mut self, session_id: Uuid, message: Message) -> StoreResult<bool> {
        let Some(index) = self.sessions.iter().position(|s| s.id == session_id) else {
            debug!("Mensagem para sessão desconhecida ignorada: {}", session_id);
            return Ok(false);
        };

        let now = self.next_timestamp();
        let mut session = self.sessions.remove(index);
        session.push(message, now);
        self.sessions.insert(0, session);

        self.persist().await?;
        Ok(true)
    }

    /// Apaga todo o histórico, em memória e no armazenamento
    pub async fn clear_all(&mut self) -> StoreResult<()> {
        self.sessions.clear();
        self.current = None;
        self.storage.remove(HISTORY_KEY).await?;

        info!("Histórico de sessões apagado");
        Ok(())
    }

    /// Horário da próxima atividade, nunca anterior ao da sessão do topo
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.sessions.first() {
            Some(front) if front.updated_at > now => front.updated_at,
            _ => now,
        }
    }

    async fn persist(&self) -> StoreResult<()> {
        let json = serde_json::to_string(&self.sessions)?;
        let blob = self.envelope.seal(&json)?;
        self.storage.set(HISTORY_KEY, &blob).await?;

        debug!("Histórico gravado: {} sessões", self.sessions.len());
        Ok(())
    }
}

fn decode_history(envelope: &Envelope, blob: &str) -> Vec<ChatSession> {
    let json = match envelope.open(blob) {
        Ok(json) => json,
        Err(e) => {
            warn!("Histórico ilegível, iniciando vazio: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&json) {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!("Histórico com formato inválido, iniciando vazio: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Cipher;
    use crate::error::StoreError;
    use crate::models::Role;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Storage {}

        #[async_trait]
        impl DurableStorage for Storage {
            async fn get(&self, key: &str) -> StoreResult<Option<String>>;
            async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
            async fn remove(&self, key: &str) -> StoreResult<()>;
        }
    }

    fn envelope() -> Envelope {
        Envelope::from_phrase("chave-de-teste", Cipher::Aes256Gcm).unwrap()
    }

    async fn empty_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone(), envelope()).await.unwrap();
        (storage, store)
    }

    fn assert_sorted(store: &SessionStore) {
        for pair in store.sessions().windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }
    }

    #[tokio::test]
    async fn test_create_session_prepends_and_activates() {
        let (_, mut store) = empty_store().await;

        let first = store.create_session().await.unwrap();
        let second = store.create_session().await.unwrap();

        assert_eq!(store.sessions()[0].id, second);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(store.current_session_id(), Some(second));
        assert!(store.current_session().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_moves_session_to_front() {
        let (_, mut store) = empty_store().await;

        let a = store.create_session().await.unwrap();
        let b = store.create_session().await.unwrap();
        let c = store.create_session().await.unwrap();

        for (id, text) in [(a, "fever"), (c, "cough"), (b, "rash"), (a, "yes")] {
            assert!(store.append_message(id, Message::user(text)).await.unwrap());
            assert_eq!(store.sessions()[0].id, id);
            assert_sorted(&store);
        }

        let order: Vec<Uuid> = store.sessions().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(store.get(a).unwrap().messages().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_is_noop() {
        let mut mock = MockStorage::new();
        mock.expect_get().returning(|_| Ok(None));
        // Nenhuma gravação pode acontecer
        mock.expect_set().never();

        let mut store = SessionStore::load(Arc::new(mock), envelope()).await.unwrap();
        let appended = store
            .append_message(Uuid::new_v4(), Message::user("hello"))
            .await
            .unwrap();

        assert!(!appended);
        assert!(store.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_history_roundtrip() {
        let (storage, mut store) = empty_store().await;

        let id = store.create_session().await.unwrap();
        store.append_message(id, Message::user("Symptoms: headache. ")).await.unwrap();
        store.append_message(id, Message::assistant("🤔 Any nausea?")).await.unwrap();

        let reloaded = SessionStore::load(storage.clone(), envelope()).await.unwrap();
        assert_eq!(reloaded.sessions(), store.sessions());
        assert_eq!(reloaded.sessions()[0].messages()[1].role, Role::Assistant);
        // Recarregar não escolhe sessão ativa sozinho
        assert_eq!(reloaded.current_session_id(), None);

        // O blob gravado não contém o texto em claro
        let blob = storage.get(HISTORY_KEY).await.unwrap().unwrap();
        assert!(!blob.contains("headache"));
    }

    #[tokio::test]
    async fn test_corrupted_history_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(HISTORY_KEY, "bm90IGEgdmFsaWQgYmxvYg==").await.unwrap();

        let store = SessionStore::load(storage.clone(), envelope()).await.unwrap();
        assert!(store.sessions().is_empty());

        // Selado com outra chave
        let other = Envelope::from_phrase("outra-chave", Cipher::Aes256Gcm).unwrap();
        storage.set(HISTORY_KEY, &other.seal("[]").unwrap()).await.unwrap();
        let store = SessionStore::load(storage.clone(), envelope()).await.unwrap();
        assert!(store.sessions().is_empty());

        // Chave certa, JSON inválido
        storage.set(HISTORY_KEY, &envelope().seal("{not json").unwrap()).await.unwrap();
        let store = SessionStore::load(storage, envelope()).await.unwrap();
        assert!(store.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_clear_then_create() {
        let (storage, mut store) = empty_store().await;

        let id = store.create_session().await.unwrap();
        store.append_message(id, Message::user("fever")).await.unwrap();
        store.create_session().await.unwrap();

        store.clear_all().await.unwrap();
        assert!(store.sessions().is_empty());
        assert_eq!(store.current_session_id(), None);
        assert_eq!(storage.get(HISTORY_KEY).await.unwrap(), None);

        let fresh = store.create_session().await.unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.current_session_id(), Some(fresh));
        assert!(store.current_session().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_active_restores_most_recent() {
        let (storage, mut store) = empty_store().await;
        let _older = store.create_session().await.unwrap();
        let newer = store.create_session().await.unwrap();

        let mut reloaded = SessionStore::load(storage, envelope()).await.unwrap();
        assert_eq!(reloaded.ensure_active().await.unwrap(), newer);
        assert_eq!(reloaded.sessions().len(), 2);

        let (_, mut empty) = empty_store().await;
        let created = empty.ensure_active().await.unwrap();
        assert_eq!(empty.sessions().len(), 1);
        assert_eq!(empty.current_session_id(), Some(created));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let mut mock = MockStorage::new();
        mock.expect_get()
            .with(eq(HISTORY_KEY))
            .returning(|_| Ok(None));
        mock.expect_set()
            .returning(|_, _| Err(StoreError::ConnectionError("disco cheio".to_string())));

        let mut store = SessionStore::load(Arc::new(mock), envelope()).await.unwrap();
        let result = store.create_session().await;
        assert!(matches!(result, Err(StoreError::ConnectionError(_))));
    }
}
