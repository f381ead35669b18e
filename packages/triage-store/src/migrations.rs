//! Migrações do armazenamento SQLite
//!
//! A versão aplicada fica em `PRAGMA user_version`; cada migração roda numa
//! transação própria junto com a atualização da versão.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_store",
    // Histórico selado e token de acesso, um valor por chave
    sql: r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    "#,
}];

/// Versão mais recente conhecida por este binário
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

async fn current_version(pool: &SqlitePool) -> i64 {
    match sqlx::query_scalar("PRAGMA user_version").fetch_one(pool).await {
        Ok(version) => version,
        Err(e) => {
            // Banco recém-criado: começa do zero
            warn!("Versão do banco indisponível ({}), assumindo 0", e);
            0
        }
    }
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .with_context(|| format!("Migração {}: falha ao abrir transação", migration.version))?;

    sqlx::query(migration.sql)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Migração {} ({}) falhou", migration.version, migration.name))?;

    // PRAGMA não aceita parâmetros ligados
    sqlx::query(&format!("PRAGMA user_version = {}", migration.version))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Migração {}: falha ao gravar versão", migration.version))?;

    tx.commit()
        .await
        .with_context(|| format!("Migração {}: falha no commit", migration.version))
}

/// Aplica as migrações pendentes, em ordem
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let from = current_version(pool).await;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();

    if pending.is_empty() {
        info!("Banco já está na versão {}", from);
        return Ok(());
    }

    for migration in pending {
        info!("Aplicando migração {} ({})", migration.version, migration.name);
        apply(pool, migration).await?;
    }

    info!("Banco migrado da versão {} para {}", from, latest_version());
    Ok(())
}
