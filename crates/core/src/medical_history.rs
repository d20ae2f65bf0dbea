//! Medical-history records and their best-effort submission.
//!
//! Submission happens in two steps:
//!
//! 1. [`plan_records`] walks the known categories in a fixed order and appends zero or more
//!    typed [`RecordRequest`]s per category. It is pure and has no network access.
//! 2. [`MedicalHistorySubmitter`] dispatches every planned request concurrently and waits for
//!    all of them to settle. A failing record never stops the others; each outcome is kept
//!    with its category and index so the caller can report or retry it.
//!
//! ## Calls per form
//!
//! | Category          | Calls                                   | Endpoint                              |
//! |-------------------|-----------------------------------------|---------------------------------------|
//! | chronic condition | one per chronic disease                 | `POST /medical-history`               |
//! | surgery           | one if surgeries were entered           | `POST /medical-history`               |
//! | allergy           | one if allergies were entered           | `POST /medical-history/allergies`     |
//! | medication        | one per medication                      | `POST /medical-history/medications`   |
//! | family history    | one per item                            | `POST /medical-history/family-history`|
//! | lifestyle         | one if any lifestyle answer was given   | `POST /medical-history/lifestyle`     |

use crate::auth::AuthToken;
use crate::backend::OnboardingBackend;
use crate::constants::{
    ALLERGIES_PATH, CHRONIC_CONDITION_NOTES, CHRONIC_CONDITION_TYPE, DEFAULT_ALLERGY_SEVERITY,
    DEFAULT_FAMILY_RELATIONSHIP, FAMILY_HISTORY_PATH, LIFESTYLE_PATH, MEDICAL_HISTORY_PATH,
    MEDICATIONS_PATH, SURGERY_NOTES, SURGERY_TYPE, UNSPECIFIED,
};
use crate::error::MedicalRecordError;
use crate::form::{LifestyleHabits, MedicalIntake, NormalizedForm};
use crate::patient::PatientId;
use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;

// ============================================================================
// RECORD TYPES
// ============================================================================

/// Medical record category. Each has its own endpoint and fixed defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    ChronicCondition,
    Surgery,
    Allergy,
    Medication,
    FamilyHistory,
    Lifestyle,
}

impl RecordCategory {
    /// Backend path the category is posted to.
    pub fn endpoint(self) -> &'static str {
        match self {
            RecordCategory::ChronicCondition | RecordCategory::Surgery => MEDICAL_HISTORY_PATH,
            RecordCategory::Allergy => ALLERGIES_PATH,
            RecordCategory::Medication => MEDICATIONS_PATH,
            RecordCategory::FamilyHistory => FAMILY_HISTORY_PATH,
            RecordCategory::Lifestyle => LIFESTYLE_PATH,
        }
    }
}

impl std::fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordCategory::ChronicCondition => "chronic condition",
            RecordCategory::Surgery => "surgery",
            RecordCategory::Allergy => "allergy",
            RecordCategory::Medication => "medication",
            RecordCategory::FamilyHistory => "family history",
            RecordCategory::Lifestyle => "lifestyle",
        };
        f.write_str(name)
    }
}

/// Chronic condition or surgery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRecord {
    pub patient_id: PatientId,
    pub condition: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub notes: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyRecord {
    pub patient_id: PatientId,
    pub allergen: String,
    pub severity: String,
    pub reaction: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    pub patient_id: PatientId,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyHistoryRecord {
    pub patient_id: PatientId,
    pub condition: String,
    pub relationship: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleRecord {
    pub patient_id: PatientId,
    #[serde(flatten)]
    pub habits: LifestyleHabits,
}

/// A medical-history record, serialised as the request body for its endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MedicalRecord {
    ChronicCondition(ConditionRecord),
    Surgery(ConditionRecord),
    Allergy(AllergyRecord),
    Medication(MedicationRecord),
    FamilyHistory(FamilyHistoryRecord),
    Lifestyle(LifestyleRecord),
}

impl MedicalRecord {
    pub fn category(&self) -> RecordCategory {
        match self {
            MedicalRecord::ChronicCondition(_) => RecordCategory::ChronicCondition,
            MedicalRecord::Surgery(_) => RecordCategory::Surgery,
            MedicalRecord::Allergy(_) => RecordCategory::Allergy,
            MedicalRecord::Medication(_) => RecordCategory::Medication,
            MedicalRecord::FamilyHistory(_) => RecordCategory::FamilyHistory,
            MedicalRecord::Lifestyle(_) => RecordCategory::Lifestyle,
        }
    }

    pub fn patient_id(&self) -> &PatientId {
        match self {
            MedicalRecord::ChronicCondition(r) | MedicalRecord::Surgery(r) => &r.patient_id,
            MedicalRecord::Allergy(r) => &r.patient_id,
            MedicalRecord::Medication(r) => &r.patient_id,
            MedicalRecord::FamilyHistory(r) => &r.patient_id,
            MedicalRecord::Lifestyle(r) => &r.patient_id,
        }
    }

    /// Short user-facing description: the text the record was built from.
    pub fn label(&self) -> String {
        match self {
            MedicalRecord::ChronicCondition(r) | MedicalRecord::Surgery(r) => r.condition.clone(),
            MedicalRecord::Allergy(r) => r.allergen.clone(),
            MedicalRecord::Medication(r) => r.name.clone(),
            MedicalRecord::FamilyHistory(r) => r.condition.clone(),
            MedicalRecord::Lifestyle(r) => format!(
                "{} / {} / {}",
                r.habits.smoking_habit, r.habits.alcohol_consumption, r.habits.activity_level
            ),
        }
    }
}

/// One planned backend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRequest {
    /// Position within the record's category, in form order.
    pub index: usize,
    pub record: MedicalRecord,
}

impl RecordRequest {
    pub fn category(&self) -> RecordCategory {
        self.record.category()
    }
}

// ============================================================================
// PLANNING
// ============================================================================

/// Build the full list of record requests for a patient, in category order.
///
/// Empty sources contribute no requests. Medications are stamped with `start_date`.
pub fn plan_records(
    patient_id: &PatientId,
    intake: &MedicalIntake,
    start_date: NaiveDate,
) -> Vec<RecordRequest> {
    let mut requests = Vec::new();
    let mut push_all = |records: Vec<MedicalRecord>| {
        requests.extend(
            records
                .into_iter()
                .enumerate()
                .map(|(index, record)| RecordRequest { index, record }),
        );
    };

    push_all(
        intake
            .chronic_diseases
            .iter()
            .map(|disease| {
                MedicalRecord::ChronicCondition(ConditionRecord {
                    patient_id: patient_id.clone(),
                    condition: disease.to_string(),
                    kind: CHRONIC_CONDITION_TYPE.into(),
                    notes: CHRONIC_CONDITION_NOTES.into(),
                })
            })
            .collect(),
    );

    push_all(
        intake
            .surgeries
            .iter()
            .map(|surgeries| {
                MedicalRecord::Surgery(ConditionRecord {
                    patient_id: patient_id.clone(),
                    condition: surgeries.to_string(),
                    kind: SURGERY_TYPE.into(),
                    notes: SURGERY_NOTES.into(),
                })
            })
            .collect(),
    );

    push_all(
        intake
            .allergies
            .iter()
            .map(|allergies| {
                MedicalRecord::Allergy(AllergyRecord {
                    patient_id: patient_id.clone(),
                    allergen: allergies.to_string(),
                    severity: DEFAULT_ALLERGY_SEVERITY.into(),
                    reaction: UNSPECIFIED.into(),
                })
            })
            .collect(),
    );

    push_all(
        intake
            .medications
            .iter()
            .map(|medication| {
                MedicalRecord::Medication(MedicationRecord {
                    patient_id: patient_id.clone(),
                    name: medication.to_string(),
                    dosage: UNSPECIFIED.into(),
                    frequency: UNSPECIFIED.into(),
                    start_date,
                })
            })
            .collect(),
    );

    push_all(
        intake
            .family_history
            .iter()
            .map(|item| {
                MedicalRecord::FamilyHistory(FamilyHistoryRecord {
                    patient_id: patient_id.clone(),
                    condition: item.to_string(),
                    relationship: DEFAULT_FAMILY_RELATIONSHIP.into(),
                })
            })
            .collect(),
    );

    push_all(
        intake
            .lifestyle
            .iter()
            .map(|habits| {
                MedicalRecord::Lifestyle(LifestyleRecord {
                    patient_id: patient_id.clone(),
                    habits: habits.clone(),
                })
            })
            .collect(),
    );

    requests
}

// ============================================================================
// SUBMISSION
// ============================================================================

/// Outcome of one record call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    pub request: RecordRequest,
    pub result: Result<(), MedicalRecordError>,
}

/// Per-record outcomes of a submission batch, in planning order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedicalSubmissionResult {
    outcomes: Vec<RecordOutcome>,
}

impl MedicalSubmissionResult {
    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    /// Number of calls dispatched.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of records the backend accepted.
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// True when every dispatched record was saved (vacuously true for an empty batch).
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &MedicalRecordError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// The requests that failed, ready to be handed back for a retry.
    pub fn failed_requests(&self) -> Vec<RecordRequest> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.request.clone())
            .collect()
    }
}

/// Fans out medical-history record calls for one patient.
pub struct MedicalHistorySubmitter<'a, B> {
    backend: &'a B,
    token: &'a AuthToken,
}

impl<'a, B: OnboardingBackend> MedicalHistorySubmitter<'a, B> {
    pub fn new(backend: &'a B, token: &'a AuthToken) -> Self {
        Self { backend, token }
    }

    /// Plan and submit every medical-history record a form implies.
    ///
    /// `start_date` is stamped on medication records; it is the date of the submission.
    /// Always completes: individual failures are captured in the returned result.
    pub async fn submit_all(
        &self,
        patient_id: &PatientId,
        form: &NormalizedForm,
        start_date: NaiveDate,
    ) -> MedicalSubmissionResult {
        let requests = plan_records(patient_id, &form.intake, start_date);
        self.dispatch(requests).await
    }

    /// Submit already-planned requests concurrently and wait for all of them to settle.
    ///
    /// Requests are sent exactly as planned, so a resubmitted medication keeps its original
    /// `startDate`. Futures are created and first polled in request order, so calls within a
    /// category are issued in form order.
    pub async fn dispatch(&self, requests: Vec<RecordRequest>) -> MedicalSubmissionResult {
        if requests.is_empty() {
            return MedicalSubmissionResult::default();
        }

        tracing::debug!(count = requests.len(), "dispatching medical-history records");

        let calls = requests.into_iter().map(|request| async move {
            let result = self
                .backend
                .submit_record(self.token, &request.record)
                .await
                .map_err(|source| MedicalRecordError {
                    category: request.category(),
                    index: request.index,
                    label: request.record.label(),
                    source,
                });

            if let Err(err) = &result {
                tracing::warn!(
                    category = %err.category,
                    index = err.index,
                    "medical-history record not saved: {}",
                    err.source
                );
            }

            RecordOutcome { request, result }
        });

        MedicalSubmissionResult {
            outcomes: join_all(calls).await,
        }
    }
}
