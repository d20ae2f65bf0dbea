//! Onboarding runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the backend client.
//! Nothing in this crate reads process-wide environment variables while a registration is
//! running; [`ConfigValues::from_env`] is meant to be called from `main`.
//!
//! The backend's authentication contract has changed more than once (register path, and whether
//! the token comes back from registration or needs a separate login), so it is configuration
//! rather than code: see [`AuthContract`].

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOGIN_PATH, DEFAULT_REGISTER_PATH,
};
use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Where the access token comes from after an account is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// The registration response body carries the token.
    RegisterResponse,
    /// Registration returns no token; log in with the same credentials to get one.
    LoginAfterRegister { login_path: String },
}

/// The backend's account-creation contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContract {
    register_path: String,
    token_source: TokenSource,
}

impl AuthContract {
    pub fn new(register_path: impl Into<String>, token_source: TokenSource) -> ConfigResult<Self> {
        let register_path = register_path.into();
        validate_path(&register_path)?;
        if let TokenSource::LoginAfterRegister { login_path } = &token_source {
            validate_path(login_path)?;
        }

        Ok(Self {
            register_path,
            token_source,
        })
    }

    pub fn register_path(&self) -> &str {
        &self.register_path
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.token_source
    }
}

impl Default for AuthContract {
    fn default() -> Self {
        Self {
            register_path: DEFAULT_REGISTER_PATH.into(),
            token_source: TokenSource::RegisterResponse,
        }
    }
}

/// Onboarding configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct OnboardingConfig {
    api_base_url: String,
    auth: AuthContract,
    request_timeout: Duration,
}

impl OnboardingConfig {
    /// Create a new `OnboardingConfig`.
    ///
    /// The base URL must be an `http://` or `https://` URL; a trailing `/` is dropped so paths
    /// can be appended directly.
    pub fn new(
        api_base_url: impl Into<String>,
        auth: AuthContract,
        request_timeout: Duration,
    ) -> ConfigResult<Self> {
        let api_base_url = api_base_url.into().trim().trim_end_matches('/').to_string();

        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidInput(format!(
                "api base url must start with http:// or https:// (got '{api_base_url}')"
            )));
        }

        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            api_base_url,
            auth,
            request_timeout,
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn auth(&self) -> &AuthContract {
        &self.auth
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Absolute URL for a backend path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

/// Raw configuration values, typically taken from the environment.
///
/// Every field is optional; blank values fall back to the defaults in [`crate::constants`].
#[derive(Clone, Debug, Default)]
pub struct ConfigValues {
    pub api_base_url: Option<String>,
    pub register_path: Option<String>,
    pub token_source: Option<String>,
    pub login_path: Option<String>,
    pub timeout_secs: Option<String>,
}

impl ConfigValues {
    /// Read the `ONBOARDING_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("ONBOARDING_API_BASE_URL").ok(),
            register_path: std::env::var("ONBOARDING_AUTH_REGISTER_PATH").ok(),
            token_source: std::env::var("ONBOARDING_AUTH_TOKEN_SOURCE").ok(),
            login_path: std::env::var("ONBOARDING_AUTH_LOGIN_PATH").ok(),
            timeout_secs: std::env::var("ONBOARDING_HTTP_TIMEOUT_SECS").ok(),
        }
    }

    /// Validate the values and build an [`OnboardingConfig`].
    pub fn resolve(self) -> ConfigResult<OnboardingConfig> {
        let auth = auth_contract_from_env_values(
            self.register_path,
            self.token_source,
            self.login_path,
        )?;
        let timeout = request_timeout_from_env_value(self.timeout_secs)?;
        let base_url = non_blank(self.api_base_url).unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        OnboardingConfig::new(base_url, auth, timeout)
    }
}

/// Parse the auth contract from optional string values.
///
/// `token_source` is `register` (default) or `login`; `login_path` is only consulted for
/// `login`.
pub fn auth_contract_from_env_values(
    register_path: Option<String>,
    token_source: Option<String>,
    login_path: Option<String>,
) -> ConfigResult<AuthContract> {
    let register_path = non_blank(register_path).unwrap_or_else(|| DEFAULT_REGISTER_PATH.into());

    let token_source = match non_blank(token_source).as_deref() {
        None | Some("register") => TokenSource::RegisterResponse,
        Some("login") => TokenSource::LoginAfterRegister {
            login_path: non_blank(login_path).unwrap_or_else(|| DEFAULT_LOGIN_PATH.into()),
        },
        Some(other) => {
            return Err(ConfigError::InvalidInput(format!(
                "unknown token source '{other}' (expected 'register' or 'login')"
            )))
        }
    };

    AuthContract::new(register_path, token_source)
}

/// Parse the HTTP request timeout (whole seconds) from an optional string value.
pub fn request_timeout_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    };

    let secs = value.parse::<u64>().map_err(|_| {
        ConfigError::InvalidInput(format!("timeout must be a whole number of seconds (got '{value}')"))
    })?;
    Ok(Duration::from_secs(secs))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') || path.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidInput(format!(
            "backend path must start with '/' and contain no whitespace (got '{path}')"
        )));
    }
    Ok(())
}
