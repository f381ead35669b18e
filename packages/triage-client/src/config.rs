//! Configuração do cliente HTTP

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Endereço padrão do serviço de diagnóstico
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuração da conexão com o serviço de diagnóstico
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL base, sem barra final
    pub base_url: String,
    /// Timeout de cada requisição, em segundos
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Lê `TRIAGE_API_URL` e `TRIAGE_API_TIMEOUT_SECS`
    pub fn from_env() -> ClientResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TRIAGE_API_URL") {
            config.base_url = url;
        }
        if let Ok(timeout) = std::env::var("TRIAGE_API_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                ClientError::Configuration(format!("TRIAGE_API_TIMEOUT_SECS inválido: {}", timeout))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "URL base deve começar com http:// ou https://: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Configuration("Timeout deve ser positivo".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Monta a URL completa de um endpoint (`path` começa com `/`)
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig::new("https://triage.example.com/");
        assert_eq!(config.endpoint("/diagnose"), "https://triage.example.com/diagnose");
        assert_eq!(ClientConfig::default().endpoint("/ask"), "http://localhost:8000/ask");
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::new("localhost:8000").validate().is_err());

        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
