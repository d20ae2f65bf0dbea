//! In-memory backend that records every call, for unit tests.

use crate::auth::AuthToken;
use crate::backend::OnboardingBackend;
use crate::error::BackendError;
use crate::form::{AccountCredentials, BiologicalSex, PatientProfile};
use crate::medical_history::{MedicalRecord, RecordCategory};
use crate::patient::PatientId;
use chrono::NaiveDate;
use onboarding_types::{EmailAddress, NonEmptyText};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RecordedCall {
    Register(AccountCredentials),
    CreatePatient {
        token: AuthToken,
        profile: PatientProfile,
    },
    Record {
        token: AuthToken,
        record: MedicalRecord,
    },
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: Mutex<Vec<RecordedCall>>,
    register_error: Option<BackendError>,
    register_without_token: bool,
    patient_error: Option<BackendError>,
    failing_labels: Vec<String>,
}

impl RecordingBackend {
    pub(crate) const TOKEN: &'static str = "recorded-token";

    pub(crate) fn patient_id() -> PatientId {
        PatientId::Numeric(42)
    }

    pub(crate) fn with_register_error(mut self, err: BackendError) -> Self {
        self.register_error = Some(err);
        self
    }

    pub(crate) fn without_token(mut self) -> Self {
        self.register_without_token = true;
        self
    }

    pub(crate) fn with_patient_error(mut self, err: BackendError) -> Self {
        self.patient_error = Some(err);
        self
    }

    /// Records whose label equals `label` fail with a 500.
    pub(crate) fn failing_on(mut self, label: &str) -> Self {
        self.failing_labels.push(label.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn records(&self) -> Vec<MedicalRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Record { record, .. } => Some(record),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn records_in(&self, category: RecordCategory) -> Vec<MedicalRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.category() == category)
            .collect()
    }

    fn push(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OnboardingBackend for RecordingBackend {
    async fn register_account(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Option<AuthToken>, BackendError> {
        self.push(RecordedCall::Register(credentials.clone()));
        if let Some(err) = &self.register_error {
            return Err(err.clone());
        }
        if self.register_without_token {
            return Ok(None);
        }
        Ok(Some(AuthToken::new(Self::TOKEN)))
    }

    async fn create_patient(
        &self,
        token: &AuthToken,
        profile: &PatientProfile,
    ) -> Result<PatientId, BackendError> {
        self.push(RecordedCall::CreatePatient {
            token: token.clone(),
            profile: profile.clone(),
        });
        match &self.patient_error {
            Some(err) => Err(err.clone()),
            None => Ok(Self::patient_id()),
        }
    }

    async fn submit_record(
        &self,
        token: &AuthToken,
        record: &MedicalRecord,
    ) -> Result<(), BackendError> {
        self.push(RecordedCall::Record {
            token: token.clone(),
            record: record.clone(),
        });
        if self.failing_labels.contains(&record.label()) {
            return Err(BackendError::Status {
                status: 500,
                body: "internal error".into(),
            });
        }
        Ok(())
    }
}

pub(crate) fn sample_credentials() -> AccountCredentials {
    AccountCredentials {
        email: EmailAddress::parse("ana.lopez@universidad.edu").unwrap(),
        password: "s3cret-pass".into(),
    }
}

pub(crate) fn sample_profile() -> PatientProfile {
    PatientProfile {
        first_name: NonEmptyText::new("Ana").unwrap(),
        last_name: "López".into(),
        phone: "5512345678".into(),
        dob: NaiveDate::from_ymd_opt(1999, 4, 12).unwrap(),
        gender: BiologicalSex::Female,
    }
}
