//! The in-progress booking record.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};
use crate::gateway::schema::{
    BookingRequest, DEFAULT_MAX_CAPACITY, DEFAULT_MIN_CAPACITY, GroupType, Program,
};

/// Participant count a fresh draft starts with.
pub const DEFAULT_NUM_STUDENTS: u32 = 15;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid")
});

/// Booking draft accumulated across the wizard steps.
///
/// Empty strings mean "not filled in yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub program_id: String,
    pub date: Option<NaiveDate>,
    pub time_block: String,
    pub school_name: String,
    pub group_type: GroupType,
    pub age_or_class: String,
    pub num_students: u32,
    pub special_requirements: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub gdpr_consent: bool,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            program_id: String::new(),
            date: None,
            time_block: String::new(),
            school_name: String::new(),
            group_type: GroupType::default(),
            age_or_class: String::new(),
            num_students: DEFAULT_NUM_STUDENTS,
            special_requirements: String::new(),
            contact_name: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            gdpr_consent: false,
        }
    }
}

impl BookingDraft {
    pub fn has_program(&self) -> bool {
        !self.program_id.trim().is_empty()
    }

    pub fn has_time_block(&self) -> bool {
        !self.time_block.trim().is_empty()
    }

    /// Check everything the details step collects, then consent.
    pub fn validate(&self, program: Option<&Program>) -> Result<(), ValidationError> {
        if !self.has_program() {
            return Err(ValidationError::Missing(Field::Program));
        }
        if self.date.is_none() {
            return Err(ValidationError::Missing(Field::Date));
        }
        if !self.has_time_block() {
            return Err(ValidationError::Missing(Field::TimeBlock));
        }
        require(&self.school_name, Field::SchoolName)?;
        require(&self.age_or_class, Field::AgeOrClass)?;
        check_participants(self.num_students, program)?;
        require(&self.contact_name, Field::ContactName)?;
        check_email(&self.contact_email)?;
        require(&self.contact_phone, Field::ContactPhone)?;
        if !self.gdpr_consent {
            return Err(ValidationError::ConsentRequired);
        }
        Ok(())
    }

    /// Validate and convert into the wire request.
    pub fn to_request(&self, program: Option<&Program>) -> Result<BookingRequest, ValidationError> {
        self.validate(program)?;
        let date = self.date.ok_or(ValidationError::Missing(Field::Date))?;
        Ok(BookingRequest {
            program_id: self.program_id.trim().to_string(),
            date,
            time_block: self.time_block.clone(),
            school_name: self.school_name.trim().to_string(),
            group_type: self.group_type,
            age_or_class: self.age_or_class.trim().to_string(),
            num_students: self.num_students,
            special_requirements: self.special_requirements.trim().to_string(),
            contact_name: self.contact_name.trim().to_string(),
            contact_email: self.contact_email.trim().to_string(),
            contact_phone: self.contact_phone.trim().to_string(),
            gdpr_consent: self.gdpr_consent,
        })
    }
}

fn require(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(())
    }
}

/// Participant count against the program's bounds (portal defaults without one).
pub fn check_participants(count: u32, program: Option<&Program>) -> Result<(), ValidationError> {
    let (min, max) = program
        .map(Program::capacity)
        .unwrap_or((DEFAULT_MIN_CAPACITY, DEFAULT_MAX_CAPACITY));
    if count < min || count > max {
        return Err(ValidationError::ParticipantsOutOfRange { count, min, max });
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Missing(Field::ContactEmail));
    }
    if !EMAIL.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
