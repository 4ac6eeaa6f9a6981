//! Availability and booking engine for counseling sessions.
//!
//! A counselor's weekly schedule is expanded into one-hour slots for a date
//! ([`availability::available_slots`]), and [`booking::book`] commits an
//! appointment so that no counselor holds two scheduled sessions at the same
//! start time.

pub mod availability;
pub mod backend;
pub mod booking;
pub mod configuration;
pub mod configuration_handler;
pub mod database_interface;
pub mod error;
pub mod http;
pub mod local_backend;
pub mod schedule;
mod schema;
pub mod slots;
#[cfg(test)]
mod testutils;
pub mod types;

pub use availability::{available_slots, resolve};
pub use backend::BookingBackend;
pub use booking::{book, BookingRequest};
pub use error::{BookingError, ErrorKind};
pub use schedule::{parse_day_spec, TimeRange};
pub use slots::{generate_slots, SLOT_DURATION};
