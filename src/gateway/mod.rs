//! Booking API gateway.
//!
//! The wizard depends only on the [`AvailabilityGateway`] trait; `HttpGateway`
//! talks to the portal's REST backend.

pub mod http;
pub mod schema;

pub use http::HttpGateway;
pub use schema::{
    BookingReceipt, BookingRequest, CalendarDay, CalendarMonth, GroupType, Program,
    ThemeSettings, TimeBlock, TimeBlockAvailability, TimeBlockStatus,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::GatewayError;

/// Operations the booking wizard consumes from the backend.
///
/// Implementations must return already-validated payloads.
#[async_trait]
pub trait AvailabilityGateway: Send + Sync {
    /// Active programs of an institution.
    async fn list_programs(&self, institution_id: &str) -> Result<Vec<Program>, GatewayError>;

    /// Availability overview for one calendar month.
    async fn calendar_month(
        &self,
        institution_id: &str,
        year: i32,
        month: u32,
    ) -> Result<CalendarMonth, GatewayError>;

    /// Time blocks of one day for one program.
    async fn time_blocks(
        &self,
        institution_id: &str,
        program_id: &str,
        date: NaiveDate,
    ) -> Result<TimeBlockAvailability, GatewayError>;

    /// Create a booking.
    async fn submit_booking(
        &self,
        institution_id: &str,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, GatewayError>;

    /// Public theme of the institution's portal.
    async fn public_theme(&self, institution_id: &str) -> Result<ThemeSettings, GatewayError>;
}
