//! Laço interativo: lê linhas com edição e histórico (rustyline), executa
//! comandos e envia o resto ao assistente.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};
use triage_client::api::ProfileFields;
use triage_client::display::{
    format_question, format_report, ANALYSIS_ABORTED_MESSAGE, NETWORK_FALLBACK_MESSAGE,
};
use triage_client::symptoms::{self, BodyRegion, COMMON_SYMPTOMS};
use triage_client::{DiagnosisClient, Reply, TriageAssistant, UserInput, MAX_QUESTIONS};

const HELP: &str = "\
Commands:
  /new                          start a new analysis
  /sessions                     list saved sessions
  /open <n>                     switch to session n
  /clear                        delete all sessions
  /symptoms                     list common symptoms
  /region <id>                  list symptoms of a body region
  /pick <a,b,...>               select symptoms for the next message
  /confidence                   show model confidence
  /login <email> <password>     sign in
  /register <email> <password> [name]
  /logout                       sign out
  /history                      list past diagnoses
  /quit                         exit
Anything else is sent to the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    New,
    Sessions,
    Open(usize),
    Clear,
    Symptoms,
    Region(BodyRegion),
    Pick(Vec<String>),
    Confidence,
    Login { email: String, password: String },
    Register { email: String, password: String, name: Option<String> },
    Logout,
    History,
    Quit,
    Say(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("help", _) => Command::Help,
            ("new", []) => Command::New,
            ("sessions", []) => Command::Sessions,
            ("open", [n]) => Command::Open(n.parse().map_err(|_| format!("Invalid session number: {}", n))?),
            ("clear", []) => Command::Clear,
            ("symptoms", []) => Command::Symptoms,
            ("region", [id]) => Command::Region(id.parse()?),
            ("pick", [_, ..]) => Command::Pick(
                args.join(" ")
                    .split(',')
                    .map(|s| s.trim().replace(' ', "_").to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            ("confidence", []) => Command::Confidence,
            ("login", [email, password]) => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("register", [email, password, name @ ..]) => Command::Register {
                email: email.to_string(),
                password: password.to_string(),
                name: (!name.is_empty()).then(|| name.join(" ")),
            },
            ("logout", []) => Command::Logout,
            ("history", []) => Command::History,
            ("quit" | "exit", []) => Command::Quit,
            _ => return Err(format!("Unknown command: /{} (try /help)", name)),
        };
        Ok(command)
    }
}

/// Sintomas selecionados aguardando o próximo envio
#[derive(Default)]
struct Selection(Vec<String>);

/// O que fazer com uma leitura do editor
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Run(Command),
    Skip,
    Stop,
}

fn next_step(read: Result<String, ReadlineError>, has_selection: bool) -> Step {
    let line = match read {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) => {
            println!("Ctrl-C: type /quit to exit.");
            return Step::Skip;
        }
        Err(ReadlineError::Eof) => return Step::Stop,
        Err(e) => {
            warn!("Falha ao ler a entrada: {}", e);
            return Step::Stop;
        }
    };
    // Linha vazia só envia quando há sintomas selecionados
    if line.trim().is_empty() && !has_selection {
        return Step::Skip;
    }

    match Command::parse(&line) {
        Ok(Command::Quit) => Step::Stop,
        Ok(command) => Step::Run(command),
        Err(message) => {
            println!("{}", message);
            Step::Skip
        }
    }
}

pub async fn run(assistant: &mut TriageAssistant<DiagnosisClient>) -> Result<()> {
    println!("Symptom triage assistant. Describe how you feel, or type /help.");
    if let Some(profile) = assistant.profile() {
        println!("Signed in as {}", profile.email);
    }

    let mut selection = Selection::default();
    let mut rl = DefaultEditor::new()?;

    loop {
        let read = rl.readline("> ");
        if let Ok(line) = &read {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
        }

        let command = match next_step(read, !selection.0.is_empty()) {
            Step::Run(command) => command,
            Step::Skip => continue,
            Step::Stop => break,
        };

        if let Err(e) = execute(assistant, &mut selection, command).await {
            warn!("Comando falhou: {}", e);
            println!("Error: {}", e);
        }
    }

    debug!("Laço interativo encerrado");
    Ok(())
}

async fn execute(
    assistant: &mut TriageAssistant<DiagnosisClient>,
    selection: &mut Selection,
    command: Command,
) -> Result<()> {
    match command {
        Command::Help => println!("{}", HELP),
        Command::New => {
            selection.0.clear();
            assistant.new_chat().await?;
            println!("New analysis started.");
        }
        Command::Sessions => print_sessions(assistant),
        Command::Open(n) => {
            let id = n
                .checked_sub(1)
                .and_then(|index| assistant.sessions().sessions().get(index))
                .map(|session| session.id);
            match id {
                Some(id) if assistant.select_session(id) => print_transcript(assistant),
                _ => println!("No session #{}", n),
            }
        }
        Command::Clear => {
            assistant.clear_history().await?;
            assistant.new_chat().await?;
            println!("History cleared.");
        }
        Command::Symptoms => {
            let names: Vec<String> = COMMON_SYMPTOMS.iter().map(|s| symptoms::display_name(s)).collect();
            println!("Common symptoms: {}", names.join(", "));
            let regions: Vec<&str> = BodyRegion::ALL.iter().map(|r| r.id()).collect();
            println!("Body regions: {}", regions.join(", "));
        }
        Command::Region(region) => {
            println!("{}:", region.display_name());
            for symptom in region.symptoms() {
                println!("  {:<28} {}", symptom, symptoms::display_name(symptom));
            }
        }
        Command::Pick(picked) => {
            for symptom in picked {
                if !symptoms::is_known(&symptom) {
                    println!("Unknown symptom ignored: {}", symptom);
                } else if !selection.0.contains(&symptom) {
                    selection.0.push(symptom);
                }
            }
            println!("Selected: {}", selection.0.join(", "));
        }
        Command::Confidence => print_confidence(assistant),
        Command::Login { email, password } => {
            assistant.service().login(&email, &password).await?;
            let profile = assistant.service().profile().await?;
            assistant.set_profile(profile);
            println!("Signed in as {}", email.trim());
        }
        Command::Register { email, password, name } => {
            let fields = ProfileFields {
                name,
                ..ProfileFields::default()
            };
            let auth = assistant.service().register(&email, &password, fields).await?;
            assistant.set_profile(auth.profile);
            println!("Account created for {}", email.trim());
        }
        Command::Logout => {
            assistant.service().logout().await?;
            assistant.set_profile(None);
            println!("Signed out.");
        }
        Command::History => {
            let events = assistant.service().diagnostic_history().await?;
            if events.is_empty() {
                println!("No past diagnoses.");
            }
            for event in events {
                println!(
                    "{}  {} ({:.1}%, {})",
                    event.created_at, event.predicted_disease, event.confidence_score, event.triage_level
                );
            }
        }
        Command::Say(text) => {
            let input = UserInput {
                text,
                selected_symptoms: std::mem::take(&mut selection.0),
            };
            let reply = assistant.send(input).await?;
            print_reply(assistant, &reply);
        }
        Command::Quit => {}
    }
    Ok(())
}

fn print_reply(assistant: &TriageAssistant<DiagnosisClient>, reply: &Reply) {
    match reply {
        Reply::Question { text, number } => {
            println!("{}", format_question(text));
            println!("(question {} of {})", number, MAX_QUESTIONS);
        }
        Reply::Report(report) => {
            println!("{}", format_report(report));
            if let Some(badge) = assistant.triage_badge() {
                println!("\nTriage: {} ({})", badge.label, badge.description);
            }
        }
        Reply::Fallback => println!("{}", NETWORK_FALLBACK_MESSAGE),
        Reply::Aborted => println!("{}", ANALYSIS_ABORTED_MESSAGE),
    }
}

fn print_confidence(assistant: &TriageAssistant<DiagnosisClient>) {
    let Some(panel) = assistant.confidence_panel() else {
        println!("No prediction yet.");
        return;
    };

    match panel.narrowing {
        Some(n) => println!("ML: {:.1}%  (narrowing... Q{}/{})", panel.header, n, MAX_QUESTIONS),
        None => println!("ML: {:.1}%", panel.header),
    }
    for (index, candidate) in panel.candidates.iter().enumerate() {
        println!("  {}. {:<30} {:>5.1}%", index + 1, candidate.name, candidate.displayed);
    }
}

fn print_sessions(assistant: &TriageAssistant<DiagnosisClient>) {
    let current = assistant.sessions().current_session_id();
    for (index, session) in assistant.sessions().sessions().iter().enumerate() {
        let marker = if Some(session.id) == current { "*" } else { " " };
        println!(
            "{} {:>2}. {:<24} {}  {}",
            marker,
            index + 1,
            session.title,
            session.updated_at.format("%Y-%m-%d %H:%M"),
            session.preview
        );
    }
}

fn print_transcript(assistant: &TriageAssistant<DiagnosisClient>) {
    let Some(session) = assistant.current_session() else {
        return;
    };
    println!("== {} ==", session.title);
    for message in session.messages() {
        println!("[{}] {}", message.role, message.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("I have a headache").unwrap(), Command::Say("I have a headache".into()));
        assert_eq!(Command::parse(" /new ").unwrap(), Command::New);
        assert_eq!(Command::parse("/open 2").unwrap(), Command::Open(2));
        assert_eq!(Command::parse("/region head").unwrap(), Command::Region(BodyRegion::Head));
        assert_eq!(
            Command::parse("/pick headache, High Fever").unwrap(),
            Command::Pick(vec!["headache".into(), "high_fever".into()])
        );
        assert_eq!(
            Command::parse("/register ana@example.com segredo Ana Souza").unwrap(),
            Command::Register {
                email: "ana@example.com".into(),
                password: "segredo".into(),
                name: Some("Ana Souza".into()),
            }
        );
        assert_eq!(Command::parse("/exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("/open two").is_err());
        assert!(Command::parse("/region tail").is_err());
        assert!(Command::parse("/login only-email").is_err());
        assert!(Command::parse("/dance").is_err());
    }

    #[test]
    fn test_next_step_from_editor_reads() {
        assert_eq!(next_step(Err(ReadlineError::Interrupted), false), Step::Skip);
        assert_eq!(next_step(Err(ReadlineError::Eof), true), Step::Stop);
        assert_eq!(next_step(Ok("/quit".into()), false), Step::Stop);
        assert_eq!(next_step(Ok("/dance".into()), false), Step::Skip);
        assert_eq!(next_step(Ok("   ".into()), false), Step::Skip);
        // Com sintomas selecionados a linha vazia é enviada
        assert_eq!(next_step(Ok("".into()), true), Step::Run(Command::Say(String::new())));
        assert_eq!(next_step(Ok("/new".into()), false), Step::Run(Command::New));
    }
}
