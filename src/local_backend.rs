use crate::{
    backend::BookingBackend,
    error::{BookingError, Result},
    types::{
        Appointment, AppointmentStatus, AvailabilitySchedule, CounselorProfile, ProfileUpdate,
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Default)]
struct LocalState {
    counselors: HashMap<Uuid, CounselorProfile>,
    appointments: HashMap<Uuid, Appointment>,
    /// One entry per `scheduled` appointment.
    scheduled_slots: HashSet<(Uuid, NaiveDateTime)>,
}

/// Non-persistent backend. All state sits behind a single lock, so a booking's
/// uniqueness check and its insert happen as one step.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    state: Arc<Mutex<LocalState>>,
}

impl LocalBackend {
    pub fn insert_example_counselors(&self) -> Result<()> {
        let weekdays = ["monday", "tuesday", "wednesday", "thursday", "friday"];
        let examples = [
            ("Alex Morgan", "09:00-12:00,14:00-17:00"),
            ("Sam Rivera", "10:00-13:30"),
        ];

        for (name, day_spec) in examples {
            let schedule = AvailabilitySchedule(
                weekdays
                    .iter()
                    .map(|day| (day.to_string(), day_spec.to_string()))
                    .collect(),
            );
            let counselor_id = Uuid::new_v4();
            self.update_profile(
                counselor_id,
                ProfileUpdate {
                    name: Some(name.into()),
                    availability_schedule: Some(schedule),
                    current_availability: Some(true),
                },
            )?;
            info!(%counselor_id, name, "Added example counselor");
        }
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, LocalState>> {
        self.state.lock().map_err(|err| {
            error!(%err, "Local booking state is poisoned");
            BookingError::Storage("local booking state is poisoned".into())
        })
    }
}

impl BookingBackend for LocalBackend {
    fn counselors(&self) -> Result<Vec<CounselorProfile>> {
        let mut counselors: Vec<CounselorProfile> = self
            .state()?
            .counselors
            .values()
            .filter(|counselor| counselor.current_availability)
            .cloned()
            .collect();
        counselors.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(counselors)
    }

    fn counselor(&self, counselor_id: Uuid) -> Result<Option<CounselorProfile>> {
        Ok(self.state()?.counselors.get(&counselor_id).cloned())
    }

    fn update_profile(
        &self,
        counselor_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<CounselorProfile> {
        let mut state = self.state()?;
        let mut profile = state
            .counselors
            .get(&counselor_id)
            .cloned()
            .unwrap_or_else(|| CounselorProfile {
                user_id: counselor_id,
                name: String::new(),
                availability_schedule: AvailabilitySchedule::default(),
                current_availability: false,
            });
        update.apply(&mut profile)?;
        state.counselors.insert(counselor_id, profile.clone());
        Ok(profile)
    }

    fn booked_start_times(
        &self,
        counselor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>> {
        let mut start_times: Vec<NaiveDateTime> = self
            .state()?
            .scheduled_slots
            .iter()
            .filter(|(counselor, start_time)| {
                *counselor == counselor_id && start_time.date() == date
            })
            .map(|(_, start_time)| *start_time)
            .collect();
        start_times.sort_unstable();
        Ok(start_times)
    }

    fn has_scheduled_appointment(
        &self,
        counselor_id: Uuid,
        start_time: NaiveDateTime,
    ) -> Result<bool> {
        Ok(self
            .state()?
            .scheduled_slots
            .contains(&(counselor_id, start_time)))
    }

    fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        let mut state = self.state()?;
        if appointment.status == AppointmentStatus::Scheduled
            && !state
                .scheduled_slots
                .insert((appointment.counselor_id, appointment.start_time))
        {
            return Err(BookingError::SlotAlreadyBooked);
        }
        state
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn appointments_for_counselor(&self, counselor_id: Uuid) -> Result<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .state()?
            .appointments
            .values()
            .filter(|appointment| appointment.counselor_id == counselor_id)
            .cloned()
            .collect();
        appointments.sort_unstable_by_key(|appointment| appointment.start_time);
        Ok(appointments)
    }

    fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut state = self.state()?;
        let appointment = state
            .appointments
            .get_mut(&appointment_id)
            .ok_or(BookingError::AppointmentNotFound(appointment_id))?;
        appointment.transition(status)?;

        let appointment = appointment.clone();
        state
            .scheduled_slots
            .remove(&(appointment.counselor_id, appointment.start_time));
        Ok(appointment)
    }
}
