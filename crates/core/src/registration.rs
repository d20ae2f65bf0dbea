//! Registration orchestration.
//!
//! A registration attempt moves through these stages:
//!
//! ```text
//! Normalizing -> Registering -> CreatingPatient -> SubmittingHistory -> Done
//!      |              |               |
//!      v              v               v
//! FailedValidation  FailedAuth    FailedPatient
//! ```
//!
//! The first three stages are fatal: a failure ends the attempt and nothing later is tried.
//! `SubmittingHistory` is best-effort and always reaches `Done`, reporting which medical records
//! were saved.
//!
//! ## Type-state
//!
//! [`Registration`] carries its stage as a type parameter. Each transition consumes the value and
//! returns the next stage, so "create a patient without a token" or "submit records without a
//! patient id" do not compile.

use crate::auth::{AuthRegistrar, AuthToken};
use crate::backend::OnboardingBackend;
use crate::error::{AuthError, MedicalRecordError, PatientCreationError, ValidationError};
use crate::form::{normalize, NormalizedForm, RegistrationForm};
use crate::medical_history::{MedicalHistorySubmitter, MedicalSubmissionResult, RecordRequest};
use crate::patient::{Patient, PatientProfileCreator};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::Instrument;

/// Where a registration attempt is, or where it ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStage {
    Normalizing,
    Registering,
    CreatingPatient,
    SubmittingHistory,
    Done,
    FailedValidation,
    FailedAuth,
    FailedPatient,
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: the form has been normalised, no remote call made yet.
#[derive(Debug)]
pub struct Normalised {
    form: NormalizedForm,
}

/// Marker type: the account exists and its token is known.
#[derive(Debug)]
pub struct Authenticated {
    form: NormalizedForm,
    token: AuthToken,
}

/// Marker type: the patient profile exists.
#[derive(Debug)]
pub struct PatientCreated {
    form: NormalizedForm,
    session: Session,
}

/// Access token plus patient, handed to the caller once registration succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: AuthToken,
    pub patient: Patient,
}

/// A registered patient and the fate of their medical-history records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredPatient {
    pub session: Session,
    pub history: MedicalSubmissionResult,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// One registration attempt, in stage `S`.
pub struct Registration<'a, B, S> {
    backend: &'a B,
    state: S,
}

impl<'a, B: OnboardingBackend> Registration<'a, B, Normalised> {
    /// Normalise `form`. No network call is made.
    pub fn new(backend: &'a B, form: &RegistrationForm) -> Result<Self, ValidationError> {
        let form = normalize(form)?;
        Ok(Self {
            backend,
            state: Normalised { form },
        })
    }

    /// Create the account.
    pub async fn register(self) -> Result<Registration<'a, B, Authenticated>, AuthError> {
        let token = AuthRegistrar::new(self.backend)
            .register(&self.state.form.credentials)
            .await?;

        Ok(Registration {
            backend: self.backend,
            state: Authenticated {
                form: self.state.form,
                token,
            },
        })
    }
}

impl<'a, B: OnboardingBackend> Registration<'a, B, Authenticated> {
    /// Create the patient profile under the new account.
    pub async fn create_patient(
        self,
    ) -> Result<Registration<'a, B, PatientCreated>, PatientCreationError> {
        let Authenticated { form, token } = self.state;
        let patient = PatientProfileCreator::new(self.backend)
            .create_patient(&token, &form.profile)
            .await?;

        Ok(Registration {
            backend: self.backend,
            state: PatientCreated {
                form,
                session: Session { token, patient },
            },
        })
    }
}

impl<'a, B: OnboardingBackend> Registration<'a, B, PatientCreated> {
    pub fn session(&self) -> &Session {
        &self.state.session
    }

    /// Submit every medical-history record. Never fails as a whole.
    pub async fn submit_history(self, start_date: NaiveDate) -> RegisteredPatient {
        let PatientCreated { form, session } = self.state;
        let history = MedicalHistorySubmitter::new(self.backend, &session.token)
            .submit_all(&session.patient.id, &form, start_date)
            .await;

        RegisteredPatient { session, history }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of one registration attempt, as reported to the UI layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Account and patient exist. Some medical records may still have failed.
    Registered(RegisteredPatient),
    /// The form was rejected locally; nothing was sent.
    Invalid(ValidationError),
    /// Account creation failed; nothing else was attempted.
    AuthFailed(AuthError),
    /// The account exists but the patient profile could not be created.
    PatientFailed(PatientCreationError),
}

impl RegistrationOutcome {
    /// The terminal stage this outcome corresponds to.
    pub fn stage(&self) -> RegistrationStage {
        match self {
            RegistrationOutcome::Registered(_) => RegistrationStage::Done,
            RegistrationOutcome::Invalid(_) => RegistrationStage::FailedValidation,
            RegistrationOutcome::AuthFailed(_) => RegistrationStage::FailedAuth,
            RegistrationOutcome::PatientFailed(_) => RegistrationStage::FailedPatient,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered(_))
    }

    /// Medical records that could not be saved. Empty unless registered.
    pub fn failed_records(&self) -> Vec<&MedicalRecordError> {
        match self {
            RegistrationOutcome::Registered(registered) => registered.history.failures().collect(),
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Runs registration attempts against a backend.
///
/// Holds no per-attempt state; one service can serve any number of attempts.
#[derive(Clone, Debug)]
pub struct OnboardingService<B> {
    backend: B,
}

impl<B: OnboardingBackend> OnboardingService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Register a patient from a filled-out form.
    ///
    /// Medication records are stamped with today's (UTC) date.
    pub async fn run(&self, form: &RegistrationForm) -> RegistrationOutcome {
        self.run_on(form, Utc::now().date_naive()).await
    }

    /// Like [`OnboardingService::run`], with an explicit submission date.
    pub async fn run_on(&self, form: &RegistrationForm, start_date: NaiveDate) -> RegistrationOutcome {
        let span = tracing::info_span!("registration", attempt_id = %uuid::Uuid::new_v4());
        self.drive(form, start_date).instrument(span).await
    }

    async fn drive(&self, form: &RegistrationForm, start_date: NaiveDate) -> RegistrationOutcome {
        tracing::info!(stage = ?RegistrationStage::Normalizing, "normalising registration form");
        let registration = match Registration::new(&self.backend, form) {
            Ok(registration) => registration,
            Err(err) => {
                tracing::warn!(stage = ?RegistrationStage::FailedValidation, "form rejected: {err}");
                return RegistrationOutcome::Invalid(err);
            }
        };

        tracing::info!(stage = ?RegistrationStage::Registering, "creating account");
        let registration = match registration.register().await {
            Ok(registration) => registration,
            Err(err) => {
                tracing::error!(stage = ?RegistrationStage::FailedAuth, "account creation failed: {err}");
                return RegistrationOutcome::AuthFailed(err);
            }
        };

        tracing::info!(stage = ?RegistrationStage::CreatingPatient, "creating patient profile");
        let registration = match registration.create_patient().await {
            Ok(registration) => registration,
            Err(err) => {
                // The account is not rolled back.
                tracing::error!(stage = ?RegistrationStage::FailedPatient, "patient creation failed: {err}");
                return RegistrationOutcome::PatientFailed(err);
            }
        };

        tracing::info!(
            stage = ?RegistrationStage::SubmittingHistory,
            patient_id = %registration.session().patient.id,
            "submitting medical history"
        );
        let registered = registration.submit_history(start_date).await;

        tracing::info!(
            stage = ?RegistrationStage::Done,
            saved = registered.history.saved(),
            attempted = registered.history.attempted(),
            "registration complete"
        );
        RegistrationOutcome::Registered(registered)
    }

    /// Resubmit medical records that failed during an earlier attempt.
    ///
    /// `requests` normally comes from [`MedicalSubmissionResult::failed_requests`] of the same
    /// session. Requests for a different patient are skipped. Records are resent as originally
    /// planned, so medications keep the `startDate` of the first attempt.
    pub async fn retry_records(
        &self,
        session: &Session,
        requests: &[RecordRequest],
    ) -> MedicalSubmissionResult {
        let (matching, foreign): (Vec<RecordRequest>, Vec<RecordRequest>) = requests
            .iter()
            .cloned()
            .partition(|request| request.record.patient_id() == &session.patient.id);

        if !foreign.is_empty() {
            tracing::warn!(
                skipped = foreign.len(),
                patient_id = %session.patient.id,
                "skipping retry of records that belong to another patient"
            );
        }

        tracing::info!(count = matching.len(), "retrying medical-history records");
        MedicalHistorySubmitter::new(&self.backend, &session.token)
            .dispatch(matching)
            .await
    }
}
