//! Constants used throughout the onboarding core crate.
//!
//! Backend paths and the fixed values sent for backend-required fields that the registration
//! form does not collect live here, so the wire contract can be read in one place.

/// Base URL used when no backend address is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Default account registration path.
pub const DEFAULT_REGISTER_PATH: &str = "/auth/register";

/// Default login path, used when the token is obtained by logging in after registering.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Patient profile creation path.
pub const PATIENTS_PATH: &str = "/patients";

/// Chronic condition and surgery records.
pub const MEDICAL_HISTORY_PATH: &str = "/medical-history";

pub const ALLERGIES_PATH: &str = "/medical-history/allergies";

pub const MEDICATIONS_PATH: &str = "/medical-history/medications";

pub const FAMILY_HISTORY_PATH: &str = "/medical-history/family-history";

pub const LIFESTYLE_PATH: &str = "/medical-history/lifestyle";

/// Placeholder for any backend-required field the form never asks about.
pub const UNSPECIFIED: &str = "No especificada";

/// `type` of a chronic condition record.
pub const CHRONIC_CONDITION_TYPE: &str = "fisico";

pub const CHRONIC_CONDITION_NOTES: &str = "Reportado durante registro";

/// `type` of a surgery record.
pub const SURGERY_TYPE: &str = "cirugia";

pub const SURGERY_NOTES: &str = "Cirugías previas";

pub const DEFAULT_ALLERGY_SEVERITY: &str = "media";

pub const DEFAULT_FAMILY_RELATIONSHIP: &str = "Familiar";

pub const DEFAULT_SMOKING_HABIT: &str = "No";

pub const DEFAULT_ALCOHOL_CONSUMPTION: &str = "No";

pub const DEFAULT_ACTIVITY_LEVEL: &str = "Sedentario";

/// Accepted date-of-birth input formats, tried in order.
pub const DATE_OF_BIRTH_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
