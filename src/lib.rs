//! Kultura Booking: client core of the school-group booking portal.

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod shell;
pub mod wizard;
