//! Formatação do que o usuário vê: confiança exibida, selo de triagem e
//! mensagens do assistente.
//!
//! A suavização de confiança só afeta valores exibidos; nada aqui altera o
//! que é enviado ao serviço.

use crate::api::{DiagnosisReport, TriageLevel};
use crate::flow::ConfidenceSnapshot;

/// Teto da confiança exibida
pub const DISPLAY_CEILING: f64 = 69.0;

/// Piso das candidatas secundárias durante o esclarecimento
pub const DISPLAY_FLOOR: f64 = 3.0;

/// Ganho por pergunta respondida
const QUESTION_BOOST: f64 = 8.0;

/// Mensagem exibida quando o serviço não responde
pub const NETWORK_FALLBACK_MESSAGE: &str =
    "Network connection issue. Please ensure the diagnosis service is reachable.";

/// Mensagem exibida quando o fluxo é abandonado por resposta incoerente
pub const ANALYSIS_ABORTED_MESSAGE: &str =
    "Sorry, I could not complete this analysis. Please start a new one.";

/// Confiança do cabeçalho; `question_number` é 0 sem fluxo ativo
pub fn header_confidence(confidence: f64, question_number: u32) -> f64 {
    (confidence + QUESTION_BOOST * question_number as f64).min(DISPLAY_CEILING)
}

/// Probabilidade exibida para a candidata na posição `index`
pub fn candidate_confidence(index: usize, probability: f64, question_number: u32) -> f64 {
    if question_number == 0 {
        return probability.min(DISPLAY_CEILING);
    }

    let q = question_number as f64;
    let shown = if index == 0 {
        probability + QUESTION_BOOST * q
    } else {
        let reduction = q * (4.0 + 2.0 * index as f64);
        (probability - reduction).max(DISPLAY_FLOOR)
    };
    shown.min(DISPLAY_CEILING)
}

/// Linha exibida de uma candidata
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLine {
    pub name: String,
    pub displayed: f64,
}

/// Painel de confiança: cabeçalho e candidatas já suavizados
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidencePanel {
    pub header: f64,
    /// `Some(n)` enquanto o esclarecimento está na pergunta `n`
    pub narrowing: Option<u32>,
    pub candidates: Vec<CandidateLine>,
}

impl ConfidencePanel {
    pub fn build(snapshot: &ConfidenceSnapshot, question_number: u32) -> Self {
        let candidates = snapshot
            .top_diseases
            .iter()
            .enumerate()
            .map(|(index, disease)| CandidateLine {
                name: disease.name.clone(),
                displayed: candidate_confidence(index, disease.probability, question_number),
            })
            .collect();

        Self {
            header: header_confidence(snapshot.confidence, question_number),
            narrowing: (question_number > 0).then_some(question_number),
            candidates,
        }
    }
}

/// Selo do nível de triagem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageBadge {
    pub label: &'static str,
    pub description: &'static str,
}

pub fn triage_badge(level: TriageLevel) -> TriageBadge {
    let (label, description) = match level {
        TriageLevel::Immediate => ("IMMEDIATE", "Emergency"),
        TriageLevel::Delayed => ("DELAYED", "Urgent"),
        TriageLevel::Minimal => ("MINIMAL", "Routine"),
        TriageLevel::Expectant => ("EXPECTANT", "Palliative"),
    };
    TriageBadge { label, description }
}

/// Mensagem do assistente com o relatório final (markdown)
pub fn format_report(report: &DiagnosisReport) -> String {
    format!(
        "### 🎯 {}\n*{} confidence*\n\n{}\n\n**Specialist:** {}\n\n**Next Steps:** {}",
        report.disease, report.confidence, report.reasoning, report.specialist, report.advice
    )
}

pub fn format_question(question: &str) -> String {
    format!("🤔 {}", question)
}

/// Mensagem do usuário: sintomas selecionados seguidos do texto livre
pub fn compose_user_message(selected_symptoms: &[String], text: &str) -> String {
    let mut message = String::new();
    if !selected_symptoms.is_empty() {
        message.push_str(&format!("Symptoms: {}. ", selected_symptoms.join(", ")));
    }
    if !text.trim().is_empty() {
        message.push_str(text);
    }
    message
}
