//! Conversa completa contra um serviço simulado: diagnóstico a frio,
//! perguntas de esclarecimento e relatório final gravados no histórico.

use std::sync::Arc;

use serde_json::json;
use triage_client::display::DISPLAY_CEILING;
use triage_client::{
    ClientConfig, CredentialContext, DiagnosisClient, FlowPhase, Reply, TriageAssistant, TriageLevel,
    UserInput,
};
use triage_store::sessions::HISTORY_KEY;
use triage_store::{Cipher, DurableStorage, Envelope, MemoryStorage, SessionStore};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST_QUESTION: &str = "Do you have sensitivity to light?";

async fn assistant_for(
    server: &MockServer,
    storage: Arc<dyn DurableStorage>,
) -> TriageAssistant<DiagnosisClient> {
    let client = DiagnosisClient::new(ClientConfig::new(server.uri()), CredentialContext::anonymous()).unwrap();
    let envelope = Envelope::from_phrase("flow-test", Cipher::ChaCha20Poly1305).unwrap();
    let sessions = SessionStore::load(storage, envelope).await.unwrap();
    TriageAssistant::new(client, sessions)
}

fn selected(symptoms: &[&str]) -> UserInput {
    UserInput {
        text: String::new(),
        selected_symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
    }
}

async fn mount_cold_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/diagnose"))
        .and(body_json(json!({"symptoms": ["headache", "high_fever"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "ask_question",
            "confidence_score": 58.0,
            "top_diseases": [
                {"name": "Migraine", "probability": 58.0},
                {"name": "Meningitis", "prob": 22.0},
                {"name": "Typhoid", "score": 9.0}
            ],
            "question": FIRST_QUESTION,
            "question_number": 1
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn question(text: &str, number: u32) -> serde_json::Value {
    json!({"action": "ask_question", "question": text, "question_number": number})
}

#[tokio::test]
async fn test_cold_start_asks_first_question() {
    let server = MockServer::start().await;
    mount_cold_start(&server).await;

    let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
    let mut assistant = assistant_for(&server, storage).await;

    let reply = assistant.send(selected(&["headache", "high_fever"])).await.unwrap();
    assert_eq!(
        reply,
        Reply::Question {
            text: FIRST_QUESTION.to_string(),
            number: 1
        }
    );
    assert_eq!(assistant.flow().phase(), FlowPhase::Clarifying(1));
    assert!(assistant.triage_badge().is_none());

    let panel = assistant.confidence_panel().unwrap();
    assert_eq!(panel.header, 66.0);
    assert_eq!(panel.candidates[1].name, "Meningitis");
    assert_eq!(panel.candidates[1].displayed, 16.0);
}

#[tokio::test]
async fn test_yes_answer_posts_history_with_prior_question_number() {
    let server = MockServer::start().await;
    mount_cold_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({
            "symptoms": ["headache", "high_fever"],
            "question_number": 1,
            "qa_history": [{"question": FIRST_QUESTION, "answer": "yes"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(question("Is your neck stiff?", 2)))
        .expect(1)
        .mount(&server)
        .await;

    let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
    let mut assistant = assistant_for(&server, storage).await;

    assistant.send(selected(&["headache", "high_fever"])).await.unwrap();
    let reply = assistant.send(UserInput::text("Yes, a lot")).await.unwrap();

    assert!(matches!(reply, Reply::Question { number: 2, .. }));
    assert_eq!(assistant.flow().phase(), FlowPhase::Clarifying(2));
}

#[tokio::test]
async fn test_three_answers_end_in_report() {
    let server = MockServer::start().await;
    mount_cold_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"question_number": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(question("Is your neck stiff?", 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"question_number": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(question("Any nausea?", 3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"question_number": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "show_report",
            "report": {
                "disease": "Migraine",
                "confidence": "High",
                "specialist": "Neurologist",
                "reasoning": "Headache with photophobia and nausea.",
                "advice": "Rest in a dark room and book a consultation.",
                "triage_level": "minimal"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
    let mut assistant = assistant_for(&server, storage.clone()).await;

    assistant.send(selected(&["headache", "high_fever"])).await.unwrap();
    assistant.send(UserInput::text("yes")).await.unwrap();

    assistant.send(UserInput::text("no")).await.unwrap();
    let panel = assistant.confidence_panel().unwrap();
    assert_eq!(panel.narrowing, Some(3));
    assert!(panel.header <= DISPLAY_CEILING);
    assert!(panel.candidates.iter().all(|c| c.displayed <= DISPLAY_CEILING));

    let reply = assistant.send(UserInput::text("yes")).await.unwrap();
    match reply {
        Reply::Report(report) => assert_eq!(report.disease, "Migraine"),
        other => panic!("esperava relatório, veio {:?}", other),
    }
    assert_eq!(assistant.flow().phase(), FlowPhase::Terminal);
    assert_eq!(assistant.flow().triage_level(), Some(TriageLevel::Minimal));
    assert_eq!(assistant.triage_badge().unwrap().label, "MINIMAL");

    // 4 mensagens do usuário e 4 do assistente, a última com o relatório
    let session = assistant.current_session().unwrap();
    assert_eq!(session.messages().len(), 8);
    assert!(session.messages()[7].content.starts_with("### 🎯 Migraine"));
    assert_eq!(session.title, "Symptoms: headache, ...");

    // O histórico persistido reabre igual
    let envelope = Envelope::from_phrase("flow-test", Cipher::ChaCha20Poly1305).unwrap();
    let reopened = SessionStore::load(storage, envelope).await.unwrap();
    assert_eq!(reopened.sessions(), assistant.sessions().sessions());
}

#[tokio::test]
async fn test_service_error_keeps_question_open() {
    let server = MockServer::start().await;
    mount_cold_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
    let mut assistant = assistant_for(&server, storage.clone()).await;

    assistant.send(selected(&["headache", "high_fever"])).await.unwrap();
    let reply = assistant.send(UserInput::text("yes")).await.unwrap();

    assert_eq!(reply, Reply::Fallback);
    assert_eq!(assistant.flow().phase(), FlowPhase::Clarifying(1));
    assert!(storage.get(HISTORY_KEY).await.unwrap().is_some());
}
