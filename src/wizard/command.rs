//! Gateway commands emitted by wizard transitions, and their outcomes.

use chrono::NaiveDate;

use super::guard::Ticket;
use crate::error::GatewayError;
use crate::gateway::{
    AvailabilityGateway, BookingReceipt, BookingRequest, CalendarMonth, Program,
    TimeBlockAvailability,
};

/// What a command asks the gateway to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadPrograms,
    LoadCalendar { year: i32, month: u32 },
    LoadTimeBlocks { program_id: String, date: NaiveDate },
    Submit(BookingRequest),
}

/// A gateway call the wizard needs before it can continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub institution_id: String,
    pub ticket: Ticket,
    pub action: Action,
}

/// Result of a command, carrying the request parameters back so the
/// wizard can compare them with its current selection.
#[derive(Debug, Clone)]
pub enum Outcome {
    Programs {
        ticket: Ticket,
        result: Result<Vec<Program>, GatewayError>,
    },
    Calendar {
        ticket: Ticket,
        year: i32,
        month: u32,
        result: Result<CalendarMonth, GatewayError>,
    },
    TimeBlocks {
        ticket: Ticket,
        program_id: String,
        date: NaiveDate,
        result: Result<TimeBlockAvailability, GatewayError>,
    },
    Submission {
        ticket: Ticket,
        result: Result<BookingReceipt, GatewayError>,
    },
}

impl Outcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Programs { ticket, .. }
            | Self::Calendar { ticket, .. }
            | Self::TimeBlocks { ticket, .. }
            | Self::Submission { ticket, .. } => *ticket,
        }
    }
}

impl Command {
    /// Execute the command against a gateway.
    pub async fn run<G>(self, gateway: &G) -> Outcome
    where
        G: AvailabilityGateway + ?Sized,
    {
        let Command {
            institution_id,
            ticket,
            action,
        } = self;
        tracing::debug!(resource = %ticket.resource, seq = ticket.seq, "Dispatching gateway call");
        match action {
            Action::LoadPrograms => Outcome::Programs {
                ticket,
                result: gateway.list_programs(&institution_id).await,
            },
            Action::LoadCalendar { year, month } => Outcome::Calendar {
                ticket,
                year,
                month,
                result: gateway.calendar_month(&institution_id, year, month).await,
            },
            Action::LoadTimeBlocks { program_id, date } => {
                let result = gateway.time_blocks(&institution_id, &program_id, date).await;
                Outcome::TimeBlocks {
                    ticket,
                    program_id,
                    date,
                    result,
                }
            }
            Action::Submit(request) => Outcome::Submission {
                ticket,
                result: gateway.submit_booking(&institution_id, &request).await,
            },
        }
    }
}
