//! Patient profile creation.

use crate::auth::AuthToken;
use crate::backend::OnboardingBackend;
use crate::error::PatientCreationError;
use crate::form::PatientProfile;
use serde::{Deserialize, Serialize};

/// Backend-assigned patient identifier.
///
/// Backends hand out either numeric or textual ids. The id is echoed back in exactly the JSON
/// shape it arrived in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientId {
    Numeric(i64),
    Text(String),
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatientId::Numeric(id) => write!(f, "{id}"),
            PatientId::Text(id) => write!(f, "{id}"),
        }
    }
}

/// A patient as created by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub id: PatientId,
    pub profile: PatientProfile,
}

/// Creates the patient profile for a freshly registered account.
pub struct PatientProfileCreator<'a, B> {
    backend: &'a B,
}

impl<'a, B: OnboardingBackend> PatientProfileCreator<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Create the patient, authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientCreationError::Rejected`] when the backend refuses the profile (4xx) and
    /// [`PatientCreationError::Backend`] for anything else. The account behind `token` is left
    /// in place either way.
    pub async fn create_patient(
        &self,
        token: &AuthToken,
        profile: &PatientProfile,
    ) -> Result<Patient, PatientCreationError> {
        let id = self.backend.create_patient(token, profile).await?;

        Ok(Patient {
            id,
            profile: profile.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::testing::{sample_profile, RecordedCall, RecordingBackend};

    #[test]
    fn patient_id_keeps_its_json_shape() {
        let numeric: PatientId = serde_json::from_str("42").expect("numeric id");
        assert_eq!(numeric, PatientId::Numeric(42));
        assert_eq!(serde_json::to_string(&numeric).expect("serialise"), "42");

        let text: PatientId = serde_json::from_str("\"c0ffee\"").expect("text id");
        assert_eq!(text, PatientId::Text("c0ffee".into()));
        assert_eq!(serde_json::to_string(&text).expect("serialise"), "\"c0ffee\"");
    }

    #[tokio::test]
    async fn creates_patient_with_bearer_token() {
        let backend = RecordingBackend::default();
        let token = AuthToken::new("token-1");
        let patient = PatientProfileCreator::new(&backend)
            .create_patient(&token, &sample_profile())
            .await
            .expect("patient created");

        assert_eq!(patient.id, RecordingBackend::patient_id());
        assert_eq!(
            backend.calls(),
            vec![RecordedCall::CreatePatient {
                token: token.clone(),
                profile: sample_profile(),
            }]
        );
    }

    #[tokio::test]
    async fn server_errors_are_backend_failures() {
        let backend = RecordingBackend::default().with_patient_error(BackendError::Status {
            status: 500,
            body: "boom".into(),
        });
        let err = PatientProfileCreator::new(&backend)
            .create_patient(&AuthToken::new("t"), &sample_profile())
            .await
            .expect_err("should fail");
        assert!(matches!(err, PatientCreationError::Backend(_)));
    }

    #[tokio::test]
    async fn validation_errors_are_rejections() {
        let backend = RecordingBackend::default().with_patient_error(BackendError::Status {
            status: 422,
            body: "phone must be numeric".into(),
        });
        let err = PatientProfileCreator::new(&backend)
            .create_patient(&AuthToken::new("t"), &sample_profile())
            .await
            .expect_err("should fail");
        assert!(matches!(err, PatientCreationError::Rejected(_)));
    }
}
