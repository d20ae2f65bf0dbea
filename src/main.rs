use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onboarding_core::{ConfigValues, HttpBackend, OnboardingService};

/// Main entry point for the onboarding service
///
/// Resolves the backend configuration once, then serves the REST facade.
///
/// # Environment Variables
/// - `ONBOARDING_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `ONBOARDING_API_BASE_URL`: clinic backend base URL (default: "http://localhost:3000")
/// - `ONBOARDING_AUTH_REGISTER_PATH`: account creation path (default: "/auth/register")
/// - `ONBOARDING_AUTH_TOKEN_SOURCE`: `register` or `login` (default: "register")
/// - `ONBOARDING_AUTH_LOGIN_PATH`: login path when the token source is `login` (default: "/auth/login")
/// - `ONBOARDING_HTTP_TIMEOUT_SECS`: per-request timeout (default: 30)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the backend configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("onboarding_run=info".parse()?)
                .add_directive("onboarding_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ONBOARDING_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let cfg = Arc::new(ConfigValues::from_env().resolve()?);
    tracing::info!("++ Onboarding backend at {}", cfg.api_base_url());

    let service = Arc::new(OnboardingService::new(HttpBackend::new(cfg)?));
    let app = api_rest::router(service);

    tracing::info!("++ Starting onboarding REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
