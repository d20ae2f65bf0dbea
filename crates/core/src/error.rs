use crate::medical_history::RecordCategory;

/// A registration form field is missing or malformed.
///
/// Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid date of birth '{0}' (expected YYYY-MM-DD or dd/mm/yyyy)")]
    InvalidDateOfBirth(String),
    #[error("invalid biological sex '{0}' (expected M, F or O)")]
    InvalidBiologicalSex(String),
}

/// Transport-level failure talking to the onboarding backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("could not connect to backend at {0}")]
    Connection(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse backend response: {0}")]
    ResponseParsing(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl BackendError {
    /// The HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend refused the request itself (4xx), as opposed to being unreachable
    /// or failing internally.
    pub fn is_rejection(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }
}

/// Account registration failed. Fatal: nothing after registration is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("an account already exists for {0}")]
    EmailTaken(String),
    #[error("registration rejected by backend: {0}")]
    Rejected(#[source] BackendError),
    #[error("registration response did not include an access token")]
    MissingToken,
    #[error("registration failed: {0}")]
    Backend(#[source] BackendError),
}

/// Patient profile creation failed. Fatal for the attempt; the account already created is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatientCreationError {
    #[error("patient profile rejected by backend: {0}")]
    Rejected(#[source] BackendError),
    #[error("patient creation failed: {0}")]
    Backend(#[source] BackendError),
}

impl From<BackendError> for PatientCreationError {
    fn from(err: BackendError) -> Self {
        if err.is_rejection() {
            PatientCreationError::Rejected(err)
        } else {
            PatientCreationError::Backend(err)
        }
    }
}

/// A single medical-history record could not be saved.
///
/// Never fatal; collected alongside the outcomes of the other records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to save {category} #{index} ('{label}'): {source}")]
pub struct MedicalRecordError {
    pub category: RecordCategory,
    /// Position of the record within its category, in form order.
    pub index: usize,
    /// The user-entered text the record was built from.
    pub label: String,
    #[source]
    pub source: BackendError,
}

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(#[source] reqwest::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
