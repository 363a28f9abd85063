//! Response and request schemas for the booking API.
//!
//! Every payload is decoded into these types and then checked, so the
//! wizard never works with a half-shaped response.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::session::Language;

/// Capacity bounds the portal assumes when a program does not declare them.
pub const DEFAULT_MIN_CAPACITY: u32 = 5;
pub const DEFAULT_MAX_CAPACITY: u32 = 30;

/// `HH:MM` or `HH:MM-HH:MM`.
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d(-([01]\d|2[0-3]):[0-5]\d)?$")
        .expect("time token pattern is valid")
});

/// Target group of a booking, as the API encodes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    #[default]
    #[serde(rename = "ms_3_6")]
    Preschool,
    #[serde(rename = "zs1_7_12")]
    PrimaryLower,
    #[serde(rename = "zs2_12_15")]
    PrimaryUpper,
    #[serde(rename = "ss_14_18")]
    Secondary,
    #[serde(rename = "gym_14_18")]
    Gymnasium,
    Adults,
}

impl GroupType {
    pub const ALL: [GroupType; 6] = [
        Self::Preschool,
        Self::PrimaryLower,
        Self::PrimaryUpper,
        Self::Secondary,
        Self::Gymnasium,
        Self::Adults,
    ];

    /// Wire code, e.g. `zs1_7_12`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Preschool => "ms_3_6",
            Self::PrimaryLower => "zs1_7_12",
            Self::PrimaryUpper => "zs2_12_15",
            Self::Secondary => "ss_14_18",
            Self::Gymnasium => "gym_14_18",
            Self::Adults => "adults",
        }
    }

    /// Human label shown in the group-type picker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preschool => "MŠ (3-6 let)",
            Self::PrimaryLower => "ZŠ I. (7-12 let)",
            Self::PrimaryUpper => "ZŠ II. (12-15 let)",
            Self::Secondary => "SŠ (14-18 let)",
            Self::Gymnasium => "GYM (14-18 let)",
            Self::Adults => "Dospělí",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.code() == code)
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A bookable guided program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    #[serde(default)]
    pub institution_id: String,
    pub name_cs: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub description_cs: String,
    #[serde(default)]
    pub description_en: String,
    /// Minutes.
    pub duration: u32,
    pub age_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<u32>,
    #[serde(default)]
    pub target_group: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

impl Program {
    /// Name in the requested language, falling back to Czech.
    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::En if !self.name_en.is_empty() => &self.name_en,
            _ => &self.name_cs,
        }
    }

    pub fn description(&self, language: Language) -> &str {
        match language {
            Language::En if !self.description_en.is_empty() => &self.description_en,
            _ => &self.description_cs,
        }
    }

    pub fn group_type(&self) -> Option<GroupType> {
        GroupType::from_code(&self.age_group)
    }

    /// Inclusive participant bounds, with portal defaults for missing ones.
    pub fn capacity(&self) -> (u32, u32) {
        (
            self.min_capacity.unwrap_or(DEFAULT_MIN_CAPACITY),
            self.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY),
        )
    }

    pub fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("program without id".to_string());
        }
        if self.duration == 0 {
            return Err(format!("program {} has zero duration", self.id));
        }
        let (min, max) = self.capacity();
        if min == 0 || min > max {
            return Err(format!(
                "program {} has invalid capacity {min}..={max}",
                self.id
            ));
        }
        Ok(())
    }
}

/// One day of a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_availability: bool,
    #[serde(default)]
    pub available_blocks: u32,
}

/// Month-level availability overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub dates: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.dates.iter().find(|d| d.date == date)
    }

    /// Check the payload answers the month that was asked for.
    pub fn check(&self, year: i32, month: u32) -> Result<(), String> {
        if self.year != year || self.month != month {
            return Err(format!(
                "asked for {year}-{month:02}, got {}-{:02}",
                self.year, self.month
            ));
        }
        if let Some(stray) = self
            .dates
            .iter()
            .find(|d| d.date.year() != year || d.date.month() != month)
        {
            return Err(format!("date {} outside {year}-{month:02}", stray.date));
        }
        Ok(())
    }
}

/// Booking state of a single time block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBlockStatus {
    Available,
    Booked,
    /// Any status this client does not know; never selectable.
    #[serde(other)]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub time: String,
    pub status: TimeBlockStatus,
}

impl TimeBlock {
    pub fn is_available(&self) -> bool {
        self.status == TimeBlockStatus::Available
    }
}

/// Time blocks of one day for one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlockAvailability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub time_blocks: Vec<TimeBlock>,
}

impl TimeBlockAvailability {
    pub fn check(&self, date: NaiveDate) -> Result<(), String> {
        if let Some(answered) = self.date {
            if answered != date {
                return Err(format!("asked for {date}, got {answered}"));
            }
        }
        for block in &self.time_blocks {
            if !TIME_TOKEN.is_match(&block.time) {
                return Err(format!("malformed time block {:?}", block.time));
            }
        }
        Ok(())
    }

    pub fn find(&self, time: &str) -> Option<&TimeBlock> {
        self.time_blocks.iter().find(|b| b.time == time)
    }
}

/// Wire form of a complete booking draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub program_id: String,
    pub date: NaiveDate,
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

/// Acknowledgment of a created booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl BookingReceipt {
    pub fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("booking acknowledged without id".to_string());
        }
        Ok(())
    }
}

/// Public theme of an institution's portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSettings {
    pub institution_id: String,
    #[serde(default = "default_primary")]
    pub primary_color: String,
    #[serde(default = "default_secondary")]
    pub secondary_color: String,
    #[serde(default = "default_accent")]
    pub accent_color: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_header_style")]
    pub header_style: String,
    #[serde(default)]
    pub footer_text: Option<String>,
}

fn default_primary() -> String {
    "#1E293B".to_string()
}

fn default_secondary() -> String {
    "#84A98C".to_string()
}

fn default_accent() -> String {
    "#E9C46A".to_string()
}

fn default_header_style() -> String {
    "light".to_string()
}

impl ThemeSettings {
    pub fn defaults_for(institution_id: &str) -> Self {
        Self {
            institution_id: institution_id.to_string(),
            primary_color: default_primary(),
            secondary_color: default_secondary(),
            accent_color: default_accent(),
            logo_url: None,
            header_style: default_header_style(),
            footer_text: None,
        }
    }
}

/// Error body. `detail` is a string for handled errors and a list of
/// `{loc, msg}` objects for request validation failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        }
    }
}
