//! # API REST
//!
//! REST facade over the onboarding orchestrator.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation (served as JSON)
//! - REST-specific concerns (JSON serialisation, CORS, status codes)
//!
//! The router is generic over the [`OnboardingBackend`] so the handlers can be exercised
//! without a live backend.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use onboarding_core::{
    AuthError, OnboardingBackend, OnboardingService, PatientCreationError, PatientId,
    RecordCategory, RegistrationForm, RegistrationOutcome, RegistrationStage,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};

/// Application state for the REST API server.
struct AppState<B> {
    service: Arc<OnboardingService<B>>,
}

// Derived Clone would require `B: Clone`.
impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A medical-history record the backend did not save.
#[derive(Debug, Serialize, ToSchema)]
pub struct FailedRecordRes {
    pub category: RecordCategory,
    /// Position within the category, in form order.
    pub index: usize,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRes {
    #[schema(value_type = Object)]
    pub patient_id: PatientId,
    pub access_token: String,
    pub records_attempted: usize,
    pub records_saved: usize,
    pub failed_records: Vec<FailedRecordRes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    /// Stage the registration stopped at.
    pub stage: RegistrationStage,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, register),
    components(schemas(
        HealthRes,
        RegistrationForm,
        RegistrationRes,
        FailedRecordRes,
        ErrorRes,
        RegistrationStage,
        RecordCategory,
    ))
)]
pub struct ApiDoc;

/// Build the REST router around an onboarding service.
///
/// Routes:
/// - `GET /health`
/// - `POST /registrations`
/// - `GET /api-docs/openapi.json`
pub fn router<B: OnboardingBackend + 'static>(service: Arc<OnboardingService<B>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/registrations", post(register::<B>))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Onboarding REST API is alive".into(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/registrations",
    request_body = RegistrationForm,
    responses(
        (status = 201, description = "Patient registered; some medical records may have failed", body = RegistrationRes),
        (status = 400, description = "Backend rejected the account or patient profile", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes),
        (status = 422, description = "Form failed validation", body = ErrorRes),
        (status = 502, description = "Backend unreachable or failing", body = ErrorRes)
    )
)]
/// Register a new patient from a filled-out form.
///
/// Creates the account, then the patient profile, then submits the medical history. The
/// response reports which medical records were not saved; those never fail the request.
///
/// # Errors
/// Returns an [`ErrorRes`] naming the stage that failed:
/// - `422` if the form is invalid (nothing was sent),
/// - `409` if the email is already registered,
/// - `400` if the backend rejected the account or patient profile,
/// - `502` if the backend could not be reached or failed.
async fn register<B: OnboardingBackend + 'static>(
    State(state): State<AppState<B>>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegistrationRes>), (StatusCode, Json<ErrorRes>)> {
    let outcome = state.service.run(&form).await;
    let stage = outcome.stage();

    let status = match &outcome {
        RegistrationOutcome::Registered(registered) => {
            let failed_records = registered
                .history
                .failures()
                .map(|failure| FailedRecordRes {
                    category: failure.category,
                    index: failure.index,
                    label: failure.label.clone(),
                    message: failure.source.to_string(),
                })
                .collect();

            return Ok((
                StatusCode::CREATED,
                Json(RegistrationRes {
                    patient_id: registered.session.patient.id.clone(),
                    access_token: registered.session.token.as_str().to_string(),
                    records_attempted: registered.history.attempted(),
                    records_saved: registered.history.saved(),
                    failed_records,
                }),
            ));
        }
        RegistrationOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationOutcome::AuthFailed(AuthError::EmailTaken(_)) => StatusCode::CONFLICT,
        RegistrationOutcome::AuthFailed(AuthError::Rejected(_))
        | RegistrationOutcome::PatientFailed(PatientCreationError::Rejected(_)) => {
            StatusCode::BAD_REQUEST
        }
        RegistrationOutcome::AuthFailed(_) | RegistrationOutcome::PatientFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
    };

    let message = match &outcome {
        RegistrationOutcome::Invalid(e) => e.to_string(),
        RegistrationOutcome::AuthFailed(e) => e.to_string(),
        RegistrationOutcome::PatientFailed(e) => e.to_string(),
        RegistrationOutcome::Registered(_) => String::new(),
    };

    tracing::info!("Registration ended at {:?} ({})", stage, status);
    Err((status, Json(ErrorRes { stage, message })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use onboarding_core::form::{AccountCredentials, PatientProfile};
    use onboarding_core::{AuthToken, BackendError, MedicalRecord};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Backend with canned answers per call.
    #[derive(Default)]
    struct StubBackend {
        register_error: Option<BackendError>,
        patient_error: Option<BackendError>,
        failing_record: Option<String>,
    }

    impl OnboardingBackend for StubBackend {
        async fn register_account(
            &self,
            _credentials: &AccountCredentials,
        ) -> Result<Option<AuthToken>, BackendError> {
            match &self.register_error {
                Some(e) => Err(e.clone()),
                None => Ok(Some(AuthToken::new("stub-token"))),
            }
        }

        async fn create_patient(
            &self,
            _token: &AuthToken,
            _profile: &PatientProfile,
        ) -> Result<PatientId, BackendError> {
            match &self.patient_error {
                Some(e) => Err(e.clone()),
                None => Ok(PatientId::Text("p-1".into())),
            }
        }

        async fn submit_record(
            &self,
            _token: &AuthToken,
            record: &MedicalRecord,
        ) -> Result<(), BackendError> {
            if self.failing_record.as_deref() == Some(record.label().as_str()) {
                return Err(BackendError::Timeout(30));
            }
            Ok(())
        }
    }

    fn app(backend: StubBackend) -> Router {
        router(Arc::new(OnboardingService::new(backend)))
    }

    fn form_body() -> Value {
        json!({
            "email": "ana.lopez@universidad.edu",
            "password": "s3cret-pass",
            "firstName": "Ana",
            "lastName": "López",
            "phone": "5512345678",
            "birthDate": "12/04/1999",
            "biologicalSex": "F",
            "chronicDiseases": ["Diabetes"],
            "medications": ["Metformina", "Losartán"]
        })
    }

    fn post_registration(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/registrations")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(StubBackend::default()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], json!(true));
    }

    #[tokio::test]
    async fn successful_registration_returns_created() {
        let response = app(StubBackend::default())
            .oneshot(post_registration(&form_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["patientId"], json!("p-1"));
        assert_eq!(body["accessToken"], json!("stub-token"));
        assert_eq!(body["recordsAttempted"], json!(3));
        assert_eq!(body["recordsSaved"], json!(3));
        assert_eq!(body["failedRecords"], json!([]));
    }

    #[tokio::test]
    async fn failed_records_are_listed_but_registration_succeeds() {
        let backend = StubBackend {
            failing_record: Some("Losartán".into()),
            ..Default::default()
        };
        let response = app(backend).oneshot(post_registration(&form_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["recordsSaved"], json!(2));
        assert_eq!(body["failedRecords"][0]["category"], json!("medication"));
        assert_eq!(body["failedRecords"][0]["index"], json!(1));
        assert_eq!(body["failedRecords"][0]["label"], json!("Losartán"));
    }

    #[tokio::test]
    async fn taken_email_is_conflict() {
        let backend = StubBackend {
            register_error: Some(BackendError::Status {
                status: 409,
                body: String::new(),
            }),
            ..Default::default()
        };
        let response = app(backend).oneshot(post_registration(&form_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["stage"], json!("failed_auth"));
    }

    #[tokio::test]
    async fn invalid_form_is_unprocessable() {
        let mut body = form_body();
        body["birthDate"] = json!("");
        let response = app(StubBackend::default())
            .oneshot(post_registration(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["stage"], json!("failed_validation"));
    }

    #[tokio::test]
    async fn patient_failure_maps_by_cause() {
        let rejected = StubBackend {
            patient_error: Some(BackendError::Status {
                status: 422,
                body: "bad phone".into(),
            }),
            ..Default::default()
        };
        let response = app(rejected).oneshot(post_registration(&form_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["stage"], json!("failed_patient"));

        let unreachable = StubBackend {
            patient_error: Some(BackendError::Connection("http://localhost:3000".into())),
            ..Default::default()
        };
        let response = app(unreachable)
            .oneshot(post_registration(&form_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn openapi_document_lists_registration_path() {
        let req = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = app(StubBackend::default()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/registrations"]["post"].is_object());
    }
}
