//! Error types for the booking client.

use chrono::NaiveDate;

use crate::wizard::WizardStep;

/// Top-level error type for the booking client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors talking to the booking API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("{endpoint} returned {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl GatewayError {
    /// The server-provided `detail`, if the API sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Booking form fields that can be missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Program,
    Date,
    TimeBlock,
    SchoolName,
    AgeOrClass,
    NumStudents,
    ContactName,
    ContactEmail,
    ContactPhone,
    Consent,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Program => "program",
            Self::Date => "date",
            Self::TimeBlock => "time block",
            Self::SchoolName => "school name",
            Self::AgeOrClass => "age or class",
            Self::NumStudents => "number of participants",
            Self::ContactName => "contact name",
            Self::ContactEmail => "contact email",
            Self::ContactPhone => "contact phone",
            Self::Consent => "GDPR consent",
        };
        write!(f, "{s}")
    }
}

/// Local, user-correctable input errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in the {0}")]
    Missing(Field),

    #[error("Unknown program {0}")]
    UnknownProgram(String),

    #[error("Number of participants must be between {min} and {max} (got {count})")]
    ParticipantsOutOfRange { count: u32, min: u32, max: u32 },

    #[error("You must agree to the processing of personal data")]
    ConsentRequired,

    #[error("{0} has no free time blocks")]
    DateUnavailable(NaiveDate),

    #[error("{0} is not in the future")]
    DateInPast(NaiveDate),

    #[error("{0} is not in the displayed month")]
    DateNotInCalendar(NaiveDate),

    #[error("{year}-{month:02} has no day {day}")]
    NoSuchDay { year: i32, month: u32, day: u32 },

    #[error("Time block {0} is not available")]
    TimeBlockUnavailable(String),

    #[error("{0} is not a valid e-mail address")]
    InvalidEmail(String),
}

/// Errors raised by wizard operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Operation not available in step {actual}, expected {expected}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    #[error("Still loading data for step {0}")]
    Busy(WizardStep),

    #[error("Invalid calendar month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Cannot go {direction} from step {step}")]
    NoTransition {
        step: WizardStep,
        direction: &'static str,
    },
}

/// Result type alias for the booking client.
pub type Result<T> = std::result::Result<T, Error>;
