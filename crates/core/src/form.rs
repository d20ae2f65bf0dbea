//! Registration form and its normalised counterpart.
//!
//! [`RegistrationForm`] mirrors what the UI collects: plain strings, optional selections and
//! multi-select lists. [`normalize`] turns it into a [`NormalizedForm`] whose parts are the typed
//! request payloads for each backend call, with defaults substituted for anything the user left
//! blank.
//!
//! Normalisation is pure. It never touches the network or the clock, and calling it twice on the
//! same form gives equal results.

use crate::constants::{
    DATE_OF_BIRTH_FORMATS, DEFAULT_ACTIVITY_LEVEL, DEFAULT_ALCOHOL_CONSUMPTION,
    DEFAULT_SMOKING_HABIT, UNSPECIFIED,
};
use crate::error::ValidationError;
use chrono::NaiveDate;
use onboarding_types::{EmailAddress, NonEmptyText, TextError};
use serde::{Deserialize, Serialize};

/// Raw registration form state as submitted by the UI.
///
/// Field names follow the UI's camelCase JSON. Every field defaults to empty so partially
/// filled forms deserialise and fail (if at all) in [`normalize`], not in serde.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    /// `YYYY-MM-DD` or `dd/mm/yyyy`.
    pub birth_date: String,
    /// `M`, `F` or `O`; blank means `O`.
    pub biological_sex: Option<String>,
    pub chronic_diseases: Vec<String>,
    pub surgeries: Option<String>,
    pub allergies: Option<String>,
    pub medications: Vec<String>,
    pub family_history: Vec<String>,
    pub smoking_habit: Option<String>,
    pub alcohol_consumption: Option<String>,
    pub physical_activity: Option<String>,
}

/// Biological sex as the backend encodes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BiologicalSex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl BiologicalSex {
    pub fn as_code(self) -> &'static str {
        match self {
            BiologicalSex::Male => "M",
            BiologicalSex::Female => "F",
            BiologicalSex::Other => "O",
        }
    }

    /// Parse the form value. Blank or missing maps to [`BiologicalSex::Other`].
    fn from_form(value: Option<&str>) -> Result<Self, ValidationError> {
        let value = value.map(str::trim).unwrap_or_default();
        match value.to_ascii_uppercase().as_str() {
            "" | "O" => Ok(BiologicalSex::Other),
            "M" => Ok(BiologicalSex::Male),
            "F" => Ok(BiologicalSex::Female),
            _ => Err(ValidationError::InvalidBiologicalSex(value.to_string())),
        }
    }
}

/// Body of the account registration (and login) call.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AccountCredentials {
    pub email: EmailAddress,
    pub password: String,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Body of the patient creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub first_name: NonEmptyText,
    pub last_name: String,
    pub phone: String,
    /// Serialised as an ISO-8601 date.
    pub dob: NaiveDate,
    pub gender: BiologicalSex,
}

/// Combined lifestyle answers with defaults filled in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleHabits {
    pub smoking_habit: String,
    pub alcohol_consumption: String,
    pub activity_level: String,
    pub diet: String,
}

/// Medical intake answers, trimmed, with blank entries removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalIntake {
    pub chronic_diseases: Vec<NonEmptyText>,
    pub surgeries: Option<NonEmptyText>,
    pub allergies: Option<NonEmptyText>,
    pub medications: Vec<NonEmptyText>,
    pub family_history: Vec<NonEmptyText>,
    /// `None` when every lifestyle question was left blank.
    pub lifestyle: Option<LifestyleHabits>,
}

/// A registration form after default substitution and type coercion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedForm {
    pub credentials: AccountCredentials,
    pub profile: PatientProfile,
    pub intake: MedicalIntake,
}

/// Validate a registration form and convert it into typed request payloads.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a required identity field is blank or malformed: email,
/// password, first name, date of birth, or an unrecognised biological sex. Medical intake
/// fields never cause an error.
pub fn normalize(form: &RegistrationForm) -> Result<NormalizedForm, ValidationError> {
    let email = EmailAddress::parse(&form.email).map_err(|err| match err {
        TextError::Empty => ValidationError::MissingField { field: "email" },
        TextError::InvalidEmail(value) => ValidationError::InvalidEmail(value),
    })?;

    // Passwords are sent exactly as typed.
    if form.password.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "password" });
    }

    let first_name = NonEmptyText::new(&form.first_name)
        .map_err(|_| ValidationError::MissingField { field: "firstName" })?;

    let profile = PatientProfile {
        first_name,
        last_name: form.last_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        dob: parse_date_of_birth(&form.birth_date)?,
        gender: BiologicalSex::from_form(form.biological_sex.as_deref())?,
    };

    let intake = MedicalIntake {
        chronic_diseases: non_blank_items(&form.chronic_diseases),
        surgeries: NonEmptyText::optional(form.surgeries.as_deref()),
        allergies: NonEmptyText::optional(form.allergies.as_deref()),
        medications: non_blank_items(&form.medications),
        family_history: non_blank_items(&form.family_history),
        lifestyle: normalize_lifestyle(form),
    };

    Ok(NormalizedForm {
        credentials: AccountCredentials {
            email,
            password: form.password.clone(),
        },
        profile,
        intake,
    })
}

fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField { field: "birthDate" });
    }

    DATE_OF_BIRTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| ValidationError::InvalidDateOfBirth(raw.to_string()))
}

fn non_blank_items(items: &[String]) -> Vec<NonEmptyText> {
    items
        .iter()
        .filter_map(|item| NonEmptyText::new(item).ok())
        .collect()
}

fn normalize_lifestyle(form: &RegistrationForm) -> Option<LifestyleHabits> {
    let smoking = NonEmptyText::optional(form.smoking_habit.as_deref());
    let alcohol = NonEmptyText::optional(form.alcohol_consumption.as_deref());
    let activity = NonEmptyText::optional(form.physical_activity.as_deref());

    if smoking.is_none() && alcohol.is_none() && activity.is_none() {
        return None;
    }

    let or_default = |value: Option<NonEmptyText>, default: &str| {
        value.map_or_else(|| default.to_string(), NonEmptyText::into_inner)
    };

    Some(LifestyleHabits {
        smoking_habit: or_default(smoking, DEFAULT_SMOKING_HABIT),
        alcohol_consumption: or_default(alcohol, DEFAULT_ALCOHOL_CONSUMPTION),
        activity_level: or_default(activity, DEFAULT_ACTIVITY_LEVEL),
        diet: UNSPECIFIED.to_string(),
    })
}
