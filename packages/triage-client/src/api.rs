//! Tipos do protocolo HTTP com o serviço de diagnóstico
//!
//! As respostas chegam com campos opcionais para o mesmo conceito; aqui
//! elas são normalizadas na decodificação (ver [`Disease`] e [`NextStep`]),
//! e o resto do crate só enxerga a forma normalizada.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::{ClientError, ClientResult};

/// Nível de triagem anexado ao relatório final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    /// Emergência
    Immediate,
    /// Urgente
    Delayed,
    /// Rotina
    Minimal,
    /// Paliativo
    Expectant,
}

impl TriageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageLevel::Immediate => "immediate",
            TriageLevel::Delayed => "delayed",
            TriageLevel::Minimal => "minimal",
            TriageLevel::Expectant => "expectant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Some(TriageLevel::Immediate),
            "delayed" => Some(TriageLevel::Delayed),
            "minimal" => Some(TriageLevel::Minimal),
            "expectant" => Some(TriageLevel::Expectant),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nível desconhecido vira `None` em vez de falhar o relatório inteiro
fn lenient_triage_level<'de, D>(deserializer: D) -> Result<Option<TriageLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(TriageLevel::parse))
}

/// Formato bruto de uma doença candidata: a probabilidade pode vir em
/// `probability`, `prob` ou `score`
#[derive(Deserialize)]
struct RawDisease {
    name: String,
    probability: Option<f64>,
    prob: Option<f64>,
    score: Option<f64>,
}

/// Doença candidata com probabilidade (0–100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDisease")]
pub struct Disease {
    pub name: String,
    pub probability: f64,
}

impl From<RawDisease> for Disease {
    fn from(raw: RawDisease) -> Self {
        Self {
            name: raw.name,
            probability: raw.probability.or(raw.prob).or(raw.score).unwrap_or(0.0),
        }
    }
}

impl Disease {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
        }
    }
}

/// Relatório final de diagnóstico
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub disease: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub specialist: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub advice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_triage_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub triage_level: Option<TriageLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_symptoms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruled_out: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_indicators: Option<Vec<String>>,
}

impl DiagnosisReport {
    /// Nível efetivo: relatório sem nível conta como rotina
    pub fn effective_triage_level(&self) -> TriageLevel {
        self.triage_level.unwrap_or(TriageLevel::Minimal)
    }
}

/// Pergunta de esclarecimento e resposta do usuário
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
}

/// Próximo passo indicado pelo serviço
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// `show_report`: diagnóstico concluído
    Report(DiagnosisReport),
    /// `ask_question`: mais uma pergunta (número começa em 1)
    Question { text: String, number: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    ShowReport,
    AskQuestion,
}

/// Campos comuns às respostas de `/diagnose` e `/ask`
#[derive(Debug, Deserialize)]
struct RawStep {
    action: Action,
    #[serde(default)]
    report: Option<DiagnosisReport>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    question_number: Option<u32>,
}

impl RawStep {
    fn into_next_step(self) -> ClientResult<NextStep> {
        match self.action {
            Action::ShowReport => self.report.map(NextStep::Report).ok_or_else(|| {
                ClientError::InvalidResponse("show_report sem relatório".to_string())
            }),
            Action::AskQuestion => match self.question {
                Some(text) if !text.trim().is_empty() => Ok(NextStep::Question {
                    text,
                    number: self.question_number,
                }),
                _ => Err(ClientError::InvalidResponse(
                    "ask_question sem pergunta".to_string(),
                )),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDiagnoseResponse {
    #[serde(flatten)]
    step: RawStep,
    #[serde(default)]
    confidence_score: f64,
    #[serde(default)]
    top_diseases: Vec<Disease>,
}

/// Resultado de `/diagnose`
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnoseResult {
    pub confidence_score: f64,
    pub top_diseases: Vec<Disease>,
    pub next: NextStep,
}

impl DiagnoseResult {
    pub fn from_json(body: &str) -> ClientResult<Self> {
        let raw: RawDiagnoseResponse = serde_json::from_str(body)?;
        Ok(Self {
            confidence_score: raw.confidence_score,
            top_diseases: raw.top_diseases,
            next: raw.step.into_next_step()?,
        })
    }
}

/// Resultado de `/ask`
#[derive(Debug, Clone, PartialEq)]
pub struct AskResult {
    pub next: NextStep,
}

impl AskResult {
    pub fn from_json(body: &str) -> ClientResult<Self> {
        let raw: RawStep = serde_json::from_str(body)?;
        Ok(Self {
            next: raw.into_next_step()?,
        })
    }
}

/// Corpo de `POST /diagnose`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnoseRequest {
    pub symptoms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

/// Corpo de `POST /ask`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub symptoms: Vec<String>,
    pub top_diseases: Vec<Disease>,
    pub question_number: u32,
    pub qa_history: Vec<QaEntry>,
}

/// Corpo de `POST /finalize` (legado)
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeRequest {
    pub symptoms: Vec<String>,
    pub top_diseases: Vec<Disease>,
    pub conversation_history: String,
}

/// Campos opcionais de perfil enviados no cadastro
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

/// Corpo de `POST /auth/register`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// Corpo de `POST /auth/login`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Perfil do usuário autenticado
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub medical_history: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Atualização parcial de perfil (`PUT /auth/profile`)
pub type ProfileUpdate = ProfileFields;

/// Resposta de cadastro e login
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub profile: Option<UserProfile>,
    pub error: Option<String>,
}

/// Resposta de `GET /auth/me`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    pub profile: Option<UserProfile>,
}

/// Resposta de `PUT /auth/profile`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// Evento do histórico de diagnósticos do usuário
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub id: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub predicted_disease: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub triage_level: String,
    #[serde(default)]
    pub specialist_recommended: String,
    #[serde(default)]
    pub created_at: String,
}

/// Resposta de `GET /events`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub events: Vec<DiagnosticEvent>,
}
