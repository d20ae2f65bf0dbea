//! The seam between the orchestrator and the onboarding backend.
//!
//! The orchestrator only ever talks to an [`OnboardingBackend`]. [`crate::http::HttpBackend`] is
//! the production implementation; tests substitute an in-memory recorder.

use crate::auth::AuthToken;
use crate::error::BackendError;
use crate::form::{AccountCredentials, PatientProfile};
use crate::medical_history::MedicalRecord;
use crate::patient::PatientId;
use std::future::Future;

/// Remote operations the registration flow depends on.
///
/// Implementations report transport and HTTP failures as [`BackendError`]; classifying them
/// (duplicate email, fatal vs. per-record) is left to the callers.
pub trait OnboardingBackend: Send + Sync {
    /// Create an account and obtain its access token.
    ///
    /// Returns `Ok(None)` when the backend accepted the account but handed back no token.
    fn register_account(
        &self,
        credentials: &AccountCredentials,
    ) -> impl Future<Output = Result<Option<AuthToken>, BackendError>> + Send;

    /// Create the patient profile owned by the authenticated account.
    fn create_patient(
        &self,
        token: &AuthToken,
        profile: &PatientProfile,
    ) -> impl Future<Output = Result<PatientId, BackendError>> + Send;

    /// Save one medical-history record.
    fn submit_record(
        &self,
        token: &AuthToken,
        record: &MedicalRecord,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
