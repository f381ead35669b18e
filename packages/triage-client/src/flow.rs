//! Controlador do fluxo de diagnóstico
//!
//! Decide, a cada turno, entre o diagnóstico a frio (`/diagnose`) e a
//! continuação do esclarecimento (`/ask`), e se a resposta traz outra
//! pergunta ou o relatório final.
//!
//! Cada turno tem três etapas: [`FlowController::begin_turn`] monta a
//! requisição e emite um [`RequestTicket`], [`dispatch`] fala com o serviço
//! sem segurar o controlador, e [`FlowController::complete_turn`] aplica a
//! resposta. Um [`FlowController::reset`] no meio do caminho invalida o
//! ticket, e a resposta atrasada é descartada.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    AskRequest, AskResult, DiagnoseRequest, DiagnoseResult, DiagnosisReport, Disease, NextStep,
    QaEntry, TriageLevel,
};
use crate::client::DiagnosisService;
use crate::error::{ClientError, ClientResult};

/// Limite de perguntas de esclarecimento por fluxo
pub const MAX_QUESTIONS: u32 = 3;

/// Erros do controlador de fluxo
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Já existe uma requisição em andamento")]
    Busy,

    #[error("Violação de protocolo: {0}")]
    ProtocolViolation(String),

    #[error(transparent)]
    Transport(#[from] ClientError),
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Fase do fluxo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    AwaitingInitialDiagnosis,
    /// Esperando a resposta do usuário à pergunta `n` (1..=3)
    Clarifying(u32),
    Terminal,
}

/// Esclarecimento em andamento
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticFlowState {
    pub symptoms: Vec<String>,
    pub top_diseases: Vec<Disease>,
    pub question_number: u32,
    pub qa_history: Vec<QaEntry>,
    pub current_question: String,
}

/// Confiança do modelo recebida no diagnóstico a frio (valores reais)
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceSnapshot {
    pub confidence: f64,
    pub top_diseases: Vec<Disease>,
}

/// Entrada de um turno
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    /// Texto digitado pelo usuário
    pub text: String,
    /// Sintomas enviados no diagnóstico a frio
    pub symptoms: Vec<String>,
    /// Histórico médico do perfil
    pub history: Option<String>,
    /// Medicamentos do perfil
    pub medications: Option<String>,
}

/// Identifica uma requisição; deixa de valer após `reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    sequence: u64,
}

/// Requisição montada para o turno
#[derive(Debug, Clone, PartialEq)]
pub enum TurnRequest {
    Diagnose(DiagnoseRequest),
    Ask(AskRequest),
}

/// Resposta do serviço para o turno
#[derive(Debug, Clone, PartialEq)]
pub enum TurnResponse {
    Diagnosed(DiagnoseResult),
    Asked(AskResult),
}

/// Turno iniciado, aguardando o serviço
#[derive(Debug, Clone)]
pub struct PendingTurn {
    ticket: RequestTicket,
    request: TurnRequest,
}

impl PendingTurn {
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn request(&self) -> &TurnRequest {
        &self.request
    }
}

/// Resultado de um turno
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Mais uma pergunta de esclarecimento
    Question { text: String, number: u32 },
    /// Relatório final
    Report(DiagnosisReport),
    /// Resposta de um turno invalidado por `reset`
    Discarded,
}

/// Normaliza a resposta: "yes"/"no" quando o texto contém um deles,
/// senão o próprio texto (minúsculo, sem espaços nas pontas)
pub fn normalize_answer(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    if lowered.contains("yes") {
        "yes".to_string()
    } else if lowered.contains("no") {
        "no".to_string()
    } else {
        lowered
    }
}

/// Envia a requisição do turno ao serviço
pub async fn dispatch<S>(service: &S, turn: &PendingTurn) -> ClientResult<TurnResponse>
where
    S: DiagnosisService + ?Sized,
{
    match &turn.request {
        TurnRequest::Diagnose(request) => service.diagnose(request).await.map(TurnResponse::Diagnosed),
        TurnRequest::Ask(request) => service.ask(request).await.map(TurnResponse::Asked),
    }
}

/// Máquina de estados do fluxo de diagnóstico
#[derive(Debug)]
pub struct FlowController {
    phase: FlowPhase,
    state: Option<DiagnosticFlowState>,
    confidence: Option<ConfidenceSnapshot>,
    triage_level: Option<TriageLevel>,
    generation: u64,
    sequence: u64,
    in_flight: Option<RequestTicket>,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    pub fn new() -> Self {
        Self {
            phase: FlowPhase::Idle,
            state: None,
            confidence: None,
            triage_level: None,
            generation: 0,
            sequence: 0,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&DiagnosticFlowState> {
        self.state.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Número da pergunta em aberto (0 sem esclarecimento ativo)
    pub fn active_question_number(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.question_number)
    }

    pub fn confidence(&self) -> Option<&ConfidenceSnapshot> {
        self.confidence.as_ref()
    }

    pub fn triage_level(&self) -> Option<TriageLevel> {
        self.triage_level
    }

    /// Há requisição em andamento
    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Volta ao estado inicial e invalida requisições em andamento
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.phase = FlowPhase::Idle;
        self.state = None;
        self.confidence = None;
        self.triage_level = None;
        debug!("Fluxo reiniciado (geração {})", self.generation);
    }

    /// Monta a requisição do turno: resposta a uma pergunta em aberto ou
    /// diagnóstico a frio
    pub fn begin_turn(&mut self, input: TurnInput) -> FlowResult<PendingTurn> {
        if self.in_flight.is_some() {
            return Err(FlowError::Busy);
        }

        let request = match &self.state {
            Some(state) if state.question_number > 0 => {
                let mut qa_history = state.qa_history.clone();
                qa_history.push(QaEntry {
                    question: state.current_question.clone(),
                    answer: normalize_answer(&input.text),
                });

                TurnRequest::Ask(AskRequest {
                    symptoms: state.symptoms.clone(),
                    top_diseases: state.top_diseases.clone(),
                    question_number: state.question_number,
                    qa_history,
                })
            }
            _ => {
                self.state = None;
                self.triage_level = None;
                self.phase = FlowPhase::AwaitingInitialDiagnosis;

                TurnRequest::Diagnose(DiagnoseRequest {
                    symptoms: input.symptoms,
                    history: input.history.filter(|h| !h.is_empty()),
                    medications: input.medications.filter(|m| !m.is_empty()),
                })
            }
        };

        self.sequence += 1;
        let ticket = RequestTicket {
            generation: self.generation,
            sequence: self.sequence,
        };
        self.in_flight = Some(ticket);

        Ok(PendingTurn { ticket, request })
    }

    /// Aplica a resposta do serviço ao fluxo
    pub fn complete_turn(
        &mut self,
        turn: PendingTurn,
        result: ClientResult<TurnResponse>,
    ) -> FlowResult<TurnOutcome> {
        if self.in_flight != Some(turn.ticket) {
            debug!("Resposta descartada (ticket {:?})", turn.ticket);
            return Ok(TurnOutcome::Discarded);
        }
        self.in_flight = None;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // Início a frio volta para Idle; pergunta em aberto continua em aberto
                if self.phase == FlowPhase::AwaitingInitialDiagnosis {
                    self.phase = FlowPhase::Idle;
                }
                warn!("Falha no turno ({:?}): {}", self.phase, e);
                return Err(FlowError::Transport(e));
            }
        };

        match (turn.request, response) {
            (TurnRequest::Diagnose(request), TurnResponse::Diagnosed(result)) => {
                self.apply_diagnosis(request, result)
            }
            (TurnRequest::Ask(request), TurnResponse::Asked(result)) => self.apply_answer(request, result),
            _ => {
                self.abandon_flow();
                Err(FlowError::ProtocolViolation(
                    "resposta não corresponde à requisição".to_string(),
                ))
            }
        }
    }

    /// Turno completo contra o serviço
    pub async fn submit<S>(&mut self, service: &S, input: TurnInput) -> FlowResult<TurnOutcome>
    where
        S: DiagnosisService + ?Sized,
    {
        let turn = self.begin_turn(input)?;
        let result = dispatch(service, &turn).await;
        self.complete_turn(turn, result)
    }

    fn apply_diagnosis(&mut self, request: DiagnoseRequest, result: DiagnoseResult) -> FlowResult<TurnOutcome> {
        self.confidence = Some(ConfidenceSnapshot {
            confidence: result.confidence_score,
            top_diseases: result.top_diseases.clone(),
        });

        match result.next {
            NextStep::Report(report) => Ok(self.finish(report)),
            NextStep::Question { text, number } => {
                // Número ausente ou 0 conta como a primeira pergunta
                let number = number.filter(|n| *n > 0).unwrap_or(1);
                if number > MAX_QUESTIONS {
                    self.abandon_flow();
                    return Err(FlowError::ProtocolViolation(format!(
                        "pergunta {} fora do intervalo 1..={}",
                        number, MAX_QUESTIONS
                    )));
                }

                info!("Esclarecimento iniciado: pergunta {}", number);
                self.state = Some(DiagnosticFlowState {
                    symptoms: request.symptoms,
                    top_diseases: result.top_diseases,
                    question_number: number,
                    qa_history: Vec::new(),
                    current_question: text.clone(),
                });
                self.phase = FlowPhase::Clarifying(number);

                Ok(TurnOutcome::Question { text, number })
            }
        }
    }

    fn apply_answer(&mut self, request: AskRequest, result: AskResult) -> FlowResult<TurnOutcome> {
        match result.next {
            NextStep::Report(report) => Ok(self.finish(report)),
            NextStep::Question { text, number } => {
                let previous = request.question_number;
                let mut number = number.unwrap_or(previous + 1);
                if number <= previous {
                    warn!("Número de pergunta {} não avança (anterior {})", number, previous);
                    number = previous + 1;
                }
                if number > MAX_QUESTIONS {
                    self.abandon_flow();
                    return Err(FlowError::ProtocolViolation(format!(
                        "serviço pediu a pergunta {} após {} respostas",
                        number, previous
                    )));
                }

                let Some(state) = self.state.as_mut() else {
                    self.abandon_flow();
                    return Err(FlowError::ProtocolViolation(
                        "resposta de esclarecimento sem fluxo ativo".to_string(),
                    ));
                };
                state.question_number = number;
                state.qa_history = request.qa_history;
                state.current_question = text.clone();
                self.phase = FlowPhase::Clarifying(number);

                debug!("Pergunta {} de {}", number, MAX_QUESTIONS);
                Ok(TurnOutcome::Question { text, number })
            }
        }
    }

    fn finish(&mut self, report: DiagnosisReport) -> TurnOutcome {
        self.triage_level = Some(report.effective_triage_level());
        self.state = None;
        self.phase = FlowPhase::Terminal;

        info!("Diagnóstico concluído (triagem {})", report.effective_triage_level());
        TurnOutcome::Report(report)
    }

    fn abandon_flow(&mut self) {
        self.state = None;
        self.phase = FlowPhase::Idle;
    }
}
