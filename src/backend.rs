use crate::error::Result;
use crate::types::{Appointment, AppointmentStatus, CounselorProfile, ProfileUpdate};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Counselor profile store and appointment store behind the booking engine.
///
/// `insert_appointment` must reject a second `scheduled` appointment for the same
/// counselor and start time atomically, reporting it as `SlotAlreadyBooked`.
pub trait BookingBackend: Clone + Send + Sync + 'static {
    /// Counselors currently accepting appointments, ordered by name.
    fn counselors(&self) -> Result<Vec<CounselorProfile>>;
    fn counselor(&self, counselor_id: Uuid) -> Result<Option<CounselorProfile>>;
    /// Creates the profile if it doesn't exist yet.
    fn update_profile(&self, counselor_id: Uuid, update: ProfileUpdate)
        -> Result<CounselorProfile>;
    /// Start times of `scheduled` appointments on `date`.
    fn booked_start_times(&self, counselor_id: Uuid, date: NaiveDate)
        -> Result<Vec<NaiveDateTime>>;
    fn has_scheduled_appointment(&self, counselor_id: Uuid, start_time: NaiveDateTime)
        -> Result<bool>;
    fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment>;
    fn appointments_for_counselor(&self, counselor_id: Uuid) -> Result<Vec<Appointment>>;
    fn update_status(&self, appointment_id: Uuid, status: AppointmentStatus)
        -> Result<Appointment>;
}
