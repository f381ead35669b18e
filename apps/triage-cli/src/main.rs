//! Assistente de triagem no terminal
//!
//! Configuração por variáveis de ambiente (`TRIAGE_API_URL`,
//! `TRIAGE_DB_PATH`, `TRIAGE_ENCRYPTION_KEY`, `TRIAGE_CIPHER`, `RUST_LOG`,
//! `TRIAGE_LOG_JSON`).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use triage_client::{ClientConfig, CredentialContext, DiagnosisClient, TriageAssistant};
use triage_store::{init_store_pool, DurableStorage, SessionStore, SqliteStorage, StoreConfig};

mod repl;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("TRIAGE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    // Logs vão para stderr; stdout é da conversa
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let store_config = StoreConfig::from_env()?;
    let pool = init_store_pool(&store_config).await?;
    let storage: Arc<dyn DurableStorage> = Arc::new(SqliteStorage::new(pool));

    let credentials = CredentialContext::restore(storage.clone())
        .await
        .context("Falha ao ler o token salvo")?;
    let client_config = ClientConfig::from_env()?;
    info!("Serviço de diagnóstico: {}", client_config.base_url);
    let client = DiagnosisClient::new(client_config, credentials)?;

    let profile = client.restore_profile().await;
    let sessions = SessionStore::load(storage, store_config.envelope()?)
        .await
        .context("Falha ao carregar o histórico")?;

    let mut assistant = TriageAssistant::new(client, sessions);
    assistant.set_profile(profile);
    assistant.ensure_session().await?;

    repl::run(&mut assistant).await
}
