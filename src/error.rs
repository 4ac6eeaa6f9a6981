//! Error types for availability queries and bookings.

use crate::types::AppointmentStatus;
use thiserror::Error;

/// Coarse classification of a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any storage access.
    Validation,
    NotFound,
    /// Expected outcome of contention. The caller may re-query and pick another slot.
    Conflict,
    /// Persistence failure, propagated unchanged.
    Storage,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid schedule format: {0}")]
    InvalidScheduleFormat(String),

    #[error("Invalid date or time: {0}")]
    InvalidDate(String),

    #[error("Invalid mode '{0}', expected 'online' or 'in-person'")]
    InvalidMode(String),

    #[error("Counselor {0} not found")]
    CounselorNotFound(uuid::Uuid),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(uuid::Uuid),

    #[error("This time slot is already booked")]
    SlotAlreadyBooked,

    #[error("Appointment can't move from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::InvalidScheduleFormat(_)
            | BookingError::InvalidDate(_)
            | BookingError::InvalidMode(_) => ErrorKind::Validation,
            BookingError::CounselorNotFound(_) | BookingError::AppointmentNotFound(_) => {
                ErrorKind::NotFound
            }
            BookingError::SlotAlreadyBooked | BookingError::InvalidTransition { .. } => {
                ErrorKind::Conflict
            }
            BookingError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Stable identifier reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidScheduleFormat(_) => "invalid_schedule",
            BookingError::InvalidDate(_) => "invalid_date",
            BookingError::InvalidMode(_) => "invalid_mode",
            BookingError::CounselorNotFound(_) => "counselor_not_found",
            BookingError::AppointmentNotFound(_) => "appointment_not_found",
            BookingError::SlotAlreadyBooked => "slot_conflict",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::Storage(_) => "storage_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case(BookingError::InvalidDate("x".into()), ErrorKind::Validation, "invalid_date")]
    #[test_case(BookingError::InvalidMode("x".into()), ErrorKind::Validation, "invalid_mode")]
    #[test_case(BookingError::CounselorNotFound(uuid::Uuid::nil()), ErrorKind::NotFound, "counselor_not_found")]
    #[test_case(BookingError::SlotAlreadyBooked, ErrorKind::Conflict, "slot_conflict")]
    #[test_case(BookingError::Storage("down".into()), ErrorKind::Storage, "storage_error")]
    fn test_error_classification(err: BookingError, kind: ErrorKind, code: &str) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.code(), code);
    }
}
