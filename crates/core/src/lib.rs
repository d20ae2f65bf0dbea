//! # Onboarding Core
//!
//! Core business logic for registering a new patient against the clinic backend.
//!
//! A registration attempt turns one filled-out form into a sequence of backend calls:
//! - Normalise the form into typed credentials, profile and medical intake
//! - Create the user account and obtain an access token
//! - Create the patient profile under that account
//! - Submit every medical-history record concurrently, best-effort
//!
//! The backend is reached through the [`OnboardingBackend`] trait. [`HttpBackend`] is the
//! `reqwest` implementation used in production.
//!
//! **No UI concerns**: the REST facade lives in `api-rest` and the command-line front end in
//! `onboarding-cli`.

pub mod auth;
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod http;
pub mod medical_history;
pub mod patient;
pub mod registration;

#[cfg(test)]
mod testing;

pub use auth::{AuthRegistrar, AuthToken};
pub use backend::OnboardingBackend;
pub use config::{AuthContract, ConfigValues, OnboardingConfig, TokenSource};
pub use error::{
    AuthError, BackendError, ConfigError, ConfigResult, MedicalRecordError, PatientCreationError,
    ValidationError,
};
pub use form::{normalize, BiologicalSex, NormalizedForm, RegistrationForm};
pub use http::HttpBackend;
pub use medical_history::{
    plan_records, MedicalHistorySubmitter, MedicalRecord, MedicalSubmissionResult, RecordCategory,
    RecordRequest,
};
pub use patient::{Patient, PatientId};
pub use registration::{
    OnboardingService, RegisteredPatient, Registration, RegistrationOutcome, RegistrationStage,
    Session,
};
