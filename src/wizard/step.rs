//! Wizard steps: the linear state machine behind the booking form.

use serde::{Deserialize, Serialize};

/// The steps of the booking wizard.
///
/// Progresses linearly: ProgramSelection → DateSelection →
/// TimeBlockSelection → DetailsAndContact → Submitted. Input steps may go
/// back one step; Submitted only resets to ProgramSelection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    ProgramSelection,
    DateSelection,
    TimeBlockSelection,
    DetailsAndContact,
    Submitted,
}

impl WizardStep {
    /// Number of input steps shown in the progress indicator.
    pub const INPUT_STEPS: u8 = 4;

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (ProgramSelection, DateSelection)
                | (DateSelection, TimeBlockSelection)
                | (TimeBlockSelection, DetailsAndContact)
                | (DetailsAndContact, Submitted)
                | (DateSelection, ProgramSelection)
                | (TimeBlockSelection, DateSelection)
                | (DetailsAndContact, TimeBlockSelection)
                | (Submitted, ProgramSelection)
        )
    }

    /// Whether this step is terminal (booking acknowledged).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Next step in the forward progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            ProgramSelection => Some(DateSelection),
            DateSelection => Some(TimeBlockSelection),
            TimeBlockSelection => Some(DetailsAndContact),
            DetailsAndContact => Some(Submitted),
            Submitted => None,
        }
    }

    /// Immediately preceding input step, if any.
    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            ProgramSelection | Submitted => None,
            DateSelection => Some(ProgramSelection),
            TimeBlockSelection => Some(DateSelection),
            DetailsAndContact => Some(TimeBlockSelection),
        }
    }

    /// 1-based position in the progress indicator; `None` once submitted.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            Self::ProgramSelection => Some(1),
            Self::DateSelection => Some(2),
            Self::TimeBlockSelection => Some(3),
            Self::DetailsAndContact => Some(4),
            Self::Submitted => None,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ProgramSelection => "program_selection",
            Self::DateSelection => "date_selection",
            Self::TimeBlockSelection => "time_block_selection",
            Self::DetailsAndContact => "details_and_contact",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_forward_transitions() {
        use WizardStep::*;
        let transitions = [
            (ProgramSelection, DateSelection),
            (DateSelection, TimeBlockSelection),
            (TimeBlockSelection, DetailsAndContact),
            (DetailsAndContact, Submitted),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
            assert_eq!(from.next(), Some(to));
        }
    }

    #[test]
    fn back_goes_one_step() {
        use WizardStep::*;
        for step in [DateSelection, TimeBlockSelection, DetailsAndContact] {
            let prev = step.previous().unwrap();
            assert!(step.can_transition_to(prev));
            assert_eq!(prev.next(), Some(step));
        }
        assert!(ProgramSelection.previous().is_none());
        assert!(Submitted.previous().is_none());
    }

    #[test]
    fn invalid_transitions() {
        use WizardStep::*;
        // Skip steps
        assert!(!ProgramSelection.can_transition_to(TimeBlockSelection));
        assert!(!DateSelection.can_transition_to(DetailsAndContact));
        assert!(!ProgramSelection.can_transition_to(Submitted));
        // Back more than one step
        assert!(!DetailsAndContact.can_transition_to(ProgramSelection));
        // Terminal only resets
        assert!(!Submitted.can_transition_to(DetailsAndContact));
        // Self-transition
        assert!(!DateSelection.can_transition_to(DateSelection));
    }

    #[test]
    fn is_terminal() {
        assert!(WizardStep::Submitted.is_terminal());
        assert!(!WizardStep::DetailsAndContact.is_terminal());
        assert!(!WizardStep::ProgramSelection.is_terminal());
    }

    #[test]
    fn ordinals_cover_input_steps() {
        use WizardStep::*;
        let ordinals: Vec<u8> = [ProgramSelection, DateSelection, TimeBlockSelection, DetailsAndContact]
            .iter()
            .filter_map(|s| s.ordinal())
            .collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert_eq!(ordinals.len() as u8, WizardStep::INPUT_STEPS);
        assert!(Submitted.ordinal().is_none());
    }

    #[test]
    fn display_matches_serde() {
        use WizardStep::*;
        for step in [
            ProgramSelection,
            DateSelection,
            TimeBlockSelection,
            DetailsAndContact,
            Submitted,
        ] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "Display and serde should match for {step:?}");
        }
    }
}
