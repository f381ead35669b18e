//! Assistente de triagem
//!
//! Junta o histórico de sessões, o controlador de fluxo e o serviço de
//! diagnóstico: cada envio grava a mensagem do usuário, roda um turno e
//! grava a resposta do assistente na mesma sessão.

use thiserror::Error;
use tracing::{info, warn};
use triage_store::{ChatSession, Message, SessionStore, StoreError};
use uuid::Uuid;

use crate::api::{DiagnosisReport, UserProfile};
use crate::client::DiagnosisService;
use crate::display::{
    compose_user_message, format_question, format_report, triage_badge, ConfidencePanel,
    TriageBadge, ANALYSIS_ABORTED_MESSAGE, NETWORK_FALLBACK_MESSAGE,
};
use crate::flow::{FlowController, FlowError, TurnInput, TurnOutcome};
use crate::symptoms::extract_symptoms;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Mensagem vazia: digite algo ou selecione sintomas")]
    EmptyInput,

    #[error(transparent)]
    Flow(FlowError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Entrada do usuário
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub text: String,
    /// Identificadores do catálogo, na ordem em que foram selecionados
    pub selected_symptoms: Vec<String>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selected_symptoms: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.selected_symptoms.is_empty()
    }
}

/// O que o assistente respondeu ao envio
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Question { text: String, number: u32 },
    Report(DiagnosisReport),
    /// Serviço indisponível; a mensagem de fallback foi gravada
    Fallback,
    /// Fluxo abandonado; o aviso para recomeçar foi gravado
    Aborted,
}

pub struct TriageAssistant<S: DiagnosisService> {
    service: S,
    sessions: SessionStore,
    flow: FlowController,
    profile: Option<UserProfile>,
}

impl<S: DiagnosisService> TriageAssistant<S> {
    pub fn new(service: S, sessions: SessionStore) -> Self {
        Self {
            service,
            sessions,
            flow: FlowController::new(),
            profile: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.sessions.current_session()
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Perfil usado para enviar histórico médico e medicamentos
    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    /// Painel de confiança do último diagnóstico, se houver
    pub fn confidence_panel(&self) -> Option<ConfidencePanel> {
        self.flow
            .confidence()
            .map(|snapshot| ConfidencePanel::build(snapshot, self.flow.active_question_number()))
    }

    pub fn triage_badge(&self) -> Option<TriageBadge> {
        self.flow.triage_level().map(triage_badge)
    }

    /// Sessão ativa, criando uma se o histórico estiver vazio
    pub async fn ensure_session(&mut self) -> Result<Uuid, AssistantError> {
        Ok(self.sessions.ensure_active().await?)
    }

    /// Inicia uma nova análise
    pub async fn new_chat(&mut self) -> Result<Uuid, AssistantError> {
        self.flow.reset();
        Ok(self.sessions.create_session().await?)
    }

    /// Troca de sessão; o fluxo em andamento é abandonado
    pub fn select_session(&mut self, id: Uuid) -> bool {
        if self.sessions.current_session_id() == Some(id) {
            return true;
        }
        let selected = self.sessions.select(id);
        if selected {
            self.flow.reset();
        }
        selected
    }

    /// Apaga todas as sessões
    pub async fn clear_history(&mut self) -> Result<(), AssistantError> {
        self.flow.reset();
        self.sessions.clear_all().await?;
        Ok(())
    }

    /// Envia a mensagem do usuário e grava a resposta do assistente
    pub async fn send(&mut self, input: UserInput) -> Result<Reply, AssistantError> {
        if input.is_empty() {
            return Err(AssistantError::EmptyInput);
        }
        if self.flow.is_processing() {
            return Err(AssistantError::Flow(FlowError::Busy));
        }

        let session_id = self.sessions.ensure_active().await?;
        let content = compose_user_message(&input.selected_symptoms, &input.text);
        self.sessions
            .append_message(session_id, Message::user(content))
            .await?;

        let symptoms = if input.selected_symptoms.is_empty() {
            extract_symptoms(&input.text)
        } else {
            input.selected_symptoms
        };
        let turn = TurnInput {
            text: input.text,
            symptoms,
            history: self.profile.as_ref().map(|p| p.medical_history.clone()),
            medications: self.profile.as_ref().map(|p| p.medications.clone()),
        };

        let (reply, content) = match self.flow.submit(&self.service, turn).await {
            Ok(TurnOutcome::Question { text, number }) => {
                let content = format_question(&text);
                (Reply::Question { text, number }, content)
            }
            Ok(TurnOutcome::Report(report)) => {
                info!("Relatório gravado na sessão {}", session_id);
                let content = format_report(&report);
                (Reply::Report(report), content)
            }
            Ok(TurnOutcome::Discarded) => {
                warn!("Turno descartado na sessão {}", session_id);
                (Reply::Aborted, ANALYSIS_ABORTED_MESSAGE.to_string())
            }
            Err(FlowError::Transport(e)) => {
                warn!("Serviço indisponível: {}", e);
                (Reply::Fallback, NETWORK_FALLBACK_MESSAGE.to_string())
            }
            Err(FlowError::ProtocolViolation(reason)) => {
                warn!("Fluxo abandonado: {}", reason);
                (Reply::Aborted, ANALYSIS_ABORTED_MESSAGE.to_string())
            }
            Err(e) => return Err(AssistantError::Flow(e)),
        };

        self.sessions
            .append_message(session_id, Message::assistant(content))
            .await?;
        Ok(reply)
    }
}
