//! Validation and commit of new appointments.

use crate::backend::BookingBackend;
use crate::error::{BookingError, Result};
use crate::slots::SLOT_DURATION;
use crate::types::{Appointment, AppointmentMode, AppointmentStatus};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub counselor_id: Uuid,
    pub student_id: Uuid,
    pub start_time: String,
    pub mode: String,
}

/// Parses an ISO datetime into the engine's wall-clock time.
///
/// Values carrying an offset (`Z`, `+02:00`) are converted to the server's
/// local time, the zone slots are generated in. Values without one are taken
/// as they are.
pub fn parse_start_time(start_time: &str) -> Result<NaiveDateTime> {
    let start_time = start_time.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(start_time) {
        return Ok(datetime.with_timezone(&Local).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(start_time, format).ok())
        .ok_or_else(|| {
            BookingError::InvalidDate(format!("'{start_time}' is not an ISO datetime"))
        })
}

/// Books a session.
///
/// Input is validated in order (start time, mode, counselor) before anything is
/// written. The existence check on the slot only saves a doomed insert; the
/// backend's constrained insert decides who wins a race.
pub fn book<B: BookingBackend>(backend: &B, request: BookingRequest) -> Result<Appointment> {
    let start_time = parse_start_time(&request.start_time)?;
    let end_time = start_time.checked_add_signed(SLOT_DURATION).ok_or_else(|| {
        BookingError::InvalidDate(format!("a session starting at {start_time} ends out of range"))
    })?;
    let mode: AppointmentMode = request.mode.parse()?;
    let counselor_id = request.counselor_id;

    if backend.counselor(counselor_id)?.is_none() {
        return Err(BookingError::CounselorNotFound(counselor_id));
    }

    if backend.has_scheduled_appointment(counselor_id, start_time)? {
        info!(%counselor_id, %start_time, "Slot already booked");
        return Err(BookingError::SlotAlreadyBooked);
    }

    let appointment = Appointment {
        id: Uuid::new_v4(),
        counselor_id,
        student_id: request.student_id,
        start_time,
        end_time,
        mode,
        status: AppointmentStatus::Scheduled,
    };

    match backend.insert_appointment(appointment) {
        Ok(appointment) => {
            info!(
                appointment_id = %appointment.id,
                %counselor_id,
                %start_time,
                "Appointment scheduled"
            );
            Ok(appointment)
        }
        Err(BookingError::SlotAlreadyBooked) => {
            warn!(%counselor_id, %start_time, "Lost booking race for slot");
            Err(BookingError::SlotAlreadyBooked)
        }
        Err(err) => Err(err),
    }
}
