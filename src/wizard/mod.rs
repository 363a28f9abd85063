//! Booking wizard: program → date → time block → details, then submit.
//!
//! The wizard collects a booking draft over four ordered steps. Steps that
//! show backend data (calendar, time blocks) emit a `Command` on entry;
//! the caller runs it and hands the `Outcome` back. Only the newest
//! outcome for a resource is applied.

pub mod command;
pub mod draft;
pub mod driver;
pub mod guard;
pub mod machine;
pub mod notice;
pub mod step;

pub use command::{Action, Command, Outcome};
pub use draft::BookingDraft;
pub use driver::Driver;
pub use guard::{Resource, Ticket};
pub use machine::{BookingWizard, GENERIC_SUBMIT_ERROR, Progress};
pub use notice::{Notice, NoticeLevel};
pub use step::WizardStep;
