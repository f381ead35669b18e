//! Triage Client - Cliente do serviço de diagnóstico
//!
//! Esta biblioteca fornece:
//! - Cliente HTTP autenticado para cadastro, login, perfil e diagnóstico
//! - Controlador do fluxo de esclarecimento (até 3 perguntas)
//! - Catálogo de sintomas e formatação das mensagens exibidas
//! - Assistente que grava a conversa no histórico criptografado

pub mod api;
pub mod assistant;
pub mod client;
pub mod config;
pub mod credentials;
pub mod display;
pub mod error;
pub mod flow;
pub mod symptoms;

pub use api::{DiagnosisReport, Disease, NextStep, QaEntry, TriageLevel, UserProfile};
pub use assistant::{AssistantError, Reply, TriageAssistant, UserInput};
pub use client::{DiagnosisClient, DiagnosisService};
pub use config::ClientConfig;
pub use credentials::CredentialContext;
pub use error::{ClientError, ClientResult};
pub use flow::{FlowController, FlowError, FlowPhase, TurnOutcome, MAX_QUESTIONS};
