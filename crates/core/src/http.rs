//! `reqwest` implementation of [`OnboardingBackend`].

use crate::auth::AuthToken;
use crate::backend::OnboardingBackend;
use crate::config::{OnboardingConfig, TokenSource};
use crate::constants::PATIENTS_PATH;
use crate::error::{BackendError, ConfigError, ConfigResult};
use crate::form::{AccountCredentials, PatientProfile};
use crate::medical_history::MedicalRecord;
use crate::patient::PatientId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// HTTP client for the onboarding backend's JSON API.
///
/// Authenticated calls carry `Authorization: Bearer <token>`. Request timeouts come from
/// [`OnboardingConfig::request_timeout`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    cfg: Arc<OnboardingConfig>,
    client: reqwest::Client,
}

/// Token-bearing response of the register and login endpoints.
///
/// Backends have used all three names; some send more than one.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, rename = "accessToken")]
    access_token_camel: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl TokenResponse {
    /// First non-blank token, in `access_token`, `accessToken`, `token` order.
    fn into_token(self) -> Option<AuthToken> {
        [self.access_token, self.access_token_camel, self.token]
            .into_iter()
            .flatten()
            .find(|token| !token.trim().is_empty())
            .map(AuthToken::new)
    }
}

#[derive(Deserialize)]
struct CreatedPatient {
    id: PatientId,
}

impl HttpBackend {
    pub fn new(cfg: Arc<OnboardingConfig>) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()
            .map_err(ConfigError::HttpClientBuild)?;

        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.cfg
    }

    async fn post_json<T>(
        &self,
        path: &str,
        token: Option<&AuthToken>,
        body: &T,
    ) -> Result<reqwest::Response, BackendError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let mut request = self.client.post(self.cfg.endpoint(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await.map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    fn send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Connection(self.cfg.api_base_url().to_string())
        } else if e.is_timeout() {
            BackendError::Timeout(self.cfg.request_timeout().as_secs())
        } else {
            BackendError::HttpClient(e.to_string())
        }
    }

    async fn read_token(response: reqwest::Response) -> Result<Option<AuthToken>, BackendError> {
        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into_token())
    }
}

impl OnboardingBackend for HttpBackend {
    async fn register_account(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Option<AuthToken>, BackendError> {
        let auth = self.cfg.auth();
        let response = self
            .post_json(auth.register_path(), None, credentials)
            .await?;

        match auth.token_source() {
            TokenSource::RegisterResponse => Self::read_token(response).await,
            TokenSource::LoginAfterRegister { login_path } => {
                tracing::debug!("account created, logging in for access token");
                let login = self.post_json(login_path, None, credentials).await?;
                Self::read_token(login).await
            }
        }
    }

    async fn create_patient(
        &self,
        token: &AuthToken,
        profile: &PatientProfile,
    ) -> Result<PatientId, BackendError> {
        let response = self.post_json(PATIENTS_PATH, Some(token), profile).await?;
        let created: CreatedPatient = response
            .json()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;

        Ok(created.id)
    }

    async fn submit_record(
        &self,
        token: &AuthToken,
        record: &MedicalRecord,
    ) -> Result<(), BackendError> {
        self.post_json(record.category().endpoint(), Some(token), record)
            .await
            .map(|_| ())
    }
}
