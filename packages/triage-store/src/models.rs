//! Modelos de dados do histórico de conversas
//!
//! Este módulo define as sessões de chat e suas mensagens, no formato
//! persistido dentro do envelope criptografado

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Título padrão de uma sessão recém-criada
pub const DEFAULT_TITLE: &str = "New Analysis";
/// Prévia padrão de uma sessão recém-criada
pub const DEFAULT_PREVIEW: &str = "Start a new conversation...";

/// Tamanho máximo da prévia (em caracteres)
pub const PREVIEW_CHARS: usize = 30;
/// Tamanho máximo do título (em caracteres)
pub const TITLE_CHARS: usize = 20;

/// Autor de uma mensagem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Usuário
    User,
    /// Assistente (aceita o valor legado "ai")
    #[serde(alias = "ai")]
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Uma mensagem da conversa (imutável depois de criada)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Uma sessão de conversa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Identificador único da sessão
    pub id: Uuid,
    /// Título exibido na lista de sessões
    pub title: String,
    /// Data e hora da última atividade
    #[serde(alias = "date")]
    pub updated_at: DateTime<Utc>,
    /// Prévia curta da última mensagem do usuário
    pub preview: String,
    /// Mensagens em ordem de chegada
    #[serde(default)]
    messages: Vec<Message>,
}

impl ChatSession {
    /// Cria uma sessão vazia
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
            updated_at: now,
            preview: DEFAULT_PREVIEW.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Anexa uma mensagem e recalcula prévia e título.
    ///
    /// O título só acompanha a primeira mensagem do usuário: deixa de mudar
    /// quando a sessão passa de duas mensagens.
    pub(crate) fn push(&mut self, message: Message, now: DateTime<Utc>) {
        if message.role == Role::User {
            self.preview = truncate_with_ellipsis(&message.content, PREVIEW_CHARS);
        }
        self.messages.push(message);

        if self.messages.len() <= 2 {
            if let Some(last) = self.messages.last().filter(|m| m.role == Role::User) {
                self.title = truncate_with_ellipsis(&last.content, TITLE_CHARS);
            }
        }

        self.updated_at = now;
    }
}

/// Corta o texto em `max` caracteres, acrescentando "..." se cortou
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_with_ellipsis("curto", 20), "curto");
        assert_eq!(truncate_with_ellipsis("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_with_ellipsis("abcdefghijk", 10), "abcdefghij...");
        // Acentos contam como um caractere
        assert_eq!(truncate_with_ellipsis("dor de cabeça forte", 13), "dor de cabeça...");
    }

    #[test]
    fn test_push_updates_preview_and_title() {
        let now = Utc::now();
        let mut session = ChatSession::new(now);
        assert_eq!(session.title, DEFAULT_TITLE);

        session.push(Message::user("Symptoms: headache, high_fever. since yesterday"), now);
        assert_eq!(session.title, "Symptoms: headache, ...");
        assert_eq!(session.preview, "Symptoms: headache, high_fever...");

        session.push(Message::assistant("🤔 Do you have a stiff neck?"), now);
        session.push(Message::user("yes"), now);

        // Título congelado a partir da terceira mensagem
        assert_eq!(session.title, "Symptoms: headache, ...");
        assert_eq!(session.preview, "yes");
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_legacy_role_alias() {
        let message: Message = serde_json::from_str(r#"{"role":"ai","content":"ok"}"#).unwrap();
        assert_eq!(message.role, Role::Assistant);

        let encoded = serde_json::to_string(&message).unwrap();
        assert!(encoded.contains("\"assistant\""));
    }
}
