//! Session context handed to the wizard at construction: the institution
//! being booked and how its portal is displayed.

use serde::{Deserialize, Serialize};

use crate::gateway::{AvailabilityGateway, ThemeSettings};

/// Display language for program texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Cs,
    En,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cs" | "cz" => Ok(Self::Cs),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cs => write!(f, "cs"),
            Self::En => write!(f, "en"),
        }
    }
}

/// Per-portal session. Created at start-up, dropped with the wizard.
#[derive(Debug, Clone)]
pub struct Session {
    pub institution_id: String,
    pub language: Language,
    pub theme: ThemeSettings,
}

impl Session {
    pub fn new(institution_id: impl Into<String>, language: Language) -> Self {
        let institution_id = institution_id.into();
        Self {
            theme: ThemeSettings::defaults_for(&institution_id),
            institution_id,
            language,
        }
    }

    pub fn with_theme(mut self, theme: ThemeSettings) -> Self {
        self.theme = theme;
        self
    }

    /// Fetch the institution's public theme. Keeps the defaults on failure.
    pub async fn load_theme<G>(self, gateway: &G) -> Self
    where
        G: AvailabilityGateway + ?Sized,
    {
        match gateway.public_theme(&self.institution_id).await {
            Ok(theme) => self.with_theme(theme),
            Err(e) => {
                tracing::warn!(error = %e, institution_id = %self.institution_id, "Using default theme");
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("CS".parse::<Language>().unwrap(), Language::Cs);
        assert_eq!(" en ".parse::<Language>().unwrap(), Language::En);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for lang in [Language::Cs, Language::En] {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(format!("\"{lang}\""), json);
        }
    }

    #[test]
    fn new_session_uses_default_theme() {
        let session = Session::new("demo", Language::En);
        assert_eq!(session.theme.institution_id, "demo");
        assert_eq!(session.theme.primary_color, "#1E293B");
    }
}
