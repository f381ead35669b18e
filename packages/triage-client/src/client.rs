//! Cliente HTTP do serviço de diagnóstico
//!
//! Traduz as operações lógicas (cadastro, login, diagnóstico, perguntas de
//! esclarecimento) em chamadas HTTP. Não há retentativas: qualquer falha
//! de rede ou status fora de 2xx volta para quem chamou.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::api::{
    AskRequest, AskResult, AuthResponse, DiagnoseRequest, DiagnoseResult, DiagnosisReport,
    DiagnosticEvent, Disease, EventsResponse, FinalizeRequest, LoginRequest, ProfileFields,
    ProfileResponse, ProfileUpdate, QaEntry, RegisterRequest, SuccessResponse, UserProfile,
};
use crate::config::ClientConfig;
use crate::credentials::CredentialContext;
use crate::error::{ClientError, ClientResult};

/// Operações do serviço usadas pelo fluxo de diagnóstico
#[async_trait]
pub trait DiagnosisService: Send + Sync {
    /// `POST /diagnose`: início a frio
    async fn diagnose(&self, request: &DiagnoseRequest) -> ClientResult<DiagnoseResult>;

    /// `POST /ask`: continuação do esclarecimento
    async fn ask(&self, request: &AskRequest) -> ClientResult<AskResult>;
}

/// Cliente principal do serviço de diagnóstico
#[derive(Clone, Debug)]
pub struct DiagnosisClient {
    http_client: Client,
    config: ClientConfig,
    credentials: CredentialContext,
}

impl DiagnosisClient {
    pub fn new(config: ClientConfig, credentials: CredentialContext) -> ClientResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialContext {
        &self.credentials
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated().await
    }

    /// Requisição com o token de acesso, quando houver
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        let builder = self.http_client.request(method, self.config.endpoint(path));
        match self.credentials.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Corpo da resposta; status fora de 2xx vira [`ClientError::Http`]
    async fn success_body(response: Response) -> ClientResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Serviço respondeu {}", status);
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Diagnóstico inicial a partir da lista de sintomas
    pub async fn diagnose_symptoms(
        &self,
        symptoms: Vec<String>,
        history: Option<String>,
        medications: Option<String>,
    ) -> ClientResult<DiagnoseResult> {
        self.diagnose(&DiagnoseRequest {
            symptoms,
            history,
            medications,
        })
        .await
    }

    /// Pergunta de esclarecimento seguinte, com o histórico acumulado
    pub async fn ask_follow_up(
        &self,
        symptoms: Vec<String>,
        top_diseases: Vec<Disease>,
        question_number: u32,
        qa_history: Vec<QaEntry>,
    ) -> ClientResult<AskResult> {
        self.ask(&AskRequest {
            symptoms,
            top_diseases,
            question_number,
            qa_history,
        })
        .await
    }

    /// Relatório direto a partir de uma conversa livre (endpoint legado)
    pub async fn finalize(
        &self,
        symptoms: Vec<String>,
        top_diseases: Vec<Disease>,
        conversation_history: String,
    ) -> ClientResult<DiagnosisReport> {
        let request = FinalizeRequest {
            symptoms,
            top_diseases,
            conversation_history,
        };

        let response = self
            .request(Method::POST, "/finalize")
            .await
            .json(&request)
            .send()
            .await?;
        let body = Self::success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Cadastro; em caso de sucesso o token fica guardado
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: ProfileFields,
    ) -> ClientResult<AuthResponse> {
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            profile,
        };
        request.validate()?;

        let response = self
            .http_client
            .post(self.config.endpoint("/auth/register"))
            .json(&request)
            .send()
            .await?;

        self.complete_auth(response, "Registration failed").await
    }

    /// Login; em caso de sucesso o token fica guardado
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let response = self
            .http_client
            .post(self.config.endpoint("/auth/login"))
            .json(&request)
            .send()
            .await?;

        self.complete_auth(response, "Invalid credentials").await
    }

    async fn complete_auth(&self, response: Response, fallback: &str) -> ClientResult<AuthResponse> {
        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<AuthResponse>(&body);
        let auth = match parsed {
            Ok(auth) => auth,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Http {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() || !auth.success {
            return Err(ClientError::auth(
                auth.error.unwrap_or_else(|| fallback.to_string()),
            ));
        }

        if let Some(token) = &auth.access_token {
            self.credentials.save(token.clone()).await?;
        }

        info!("Usuário autenticado: {}", auth.user_id.as_deref().unwrap_or("-"));
        Ok(auth)
    }

    /// Encerra a sessão local (token em memória e no armazenamento)
    pub async fn logout(&self) -> ClientResult<()> {
        self.credentials.clear().await?;
        info!("Sessão encerrada");
        Ok(())
    }

    /// Perfil do usuário autenticado; `None` se o serviço recusar
    pub async fn profile(&self) -> ClientResult<Option<UserProfile>> {
        let response = self.request(Method::GET, "/auth/me").await.send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let parsed: ProfileResponse = response.json().await?;
        Ok(parsed.profile.filter(|_| parsed.success))
    }

    /// Recarga: busca o perfil se houver token guardado.
    ///
    /// Falhas são registradas e tratadas como ausência de perfil.
    pub async fn restore_profile(&self) -> Option<UserProfile> {
        if !self.is_authenticated().await {
            return None;
        }

        match self.profile().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Nenhuma sessão válida encontrada: {}", e);
                None
            }
        }
    }

    /// Atualização parcial do perfil
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<bool> {
        let response = self
            .request(Method::PUT, "/auth/profile")
            .await
            .json(update)
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(false);
        }

        let parsed: SuccessResponse = response.json().await?;
        Ok(parsed.success)
    }

    /// Histórico de diagnósticos do usuário; vazio se o serviço recusar
    pub async fn diagnostic_history(&self) -> ClientResult<Vec<DiagnosticEvent>> {
        let response = self.request(Method::GET, "/events").await.send().await?;
        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let parsed: EventsResponse = response.json().await?;
        Ok(parsed.events)
    }
}

#[async_trait]
impl DiagnosisService for DiagnosisClient {
    async fn diagnose(&self, request: &DiagnoseRequest) -> ClientResult<DiagnoseResult> {
        let response = self
            .request(Method::POST, "/diagnose")
            .await
            .json(request)
            .send()
            .await?;
        let body = Self::success_body(response).await?;
        DiagnoseResult::from_json(&body)
    }

    async fn ask(&self, request: &AskRequest) -> ClientResult<AskResult> {
        let response = self
            .request(Method::POST, "/ask")
            .await
            .json(request)
            .send()
            .await?;
        let body = Self::success_body(response).await?;
        AskResult::from_json(&body)
    }
}
