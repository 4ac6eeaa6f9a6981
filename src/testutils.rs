use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::{
    backend::BookingBackend,
    error::{BookingError, Result},
    local_backend::LocalBackend,
    types::{
        Appointment, AppointmentStatus, AvailabilitySchedule, CounselorProfile, ProfileUpdate,
    },
};

/// Registers a counselor who works `day_spec` on every weekday.
pub fn example_counselor(backend: &LocalBackend, day_spec: &str) -> Uuid {
    let counselor_id = Uuid::new_v4();
    backend
        .update_profile(
            counselor_id,
            ProfileUpdate {
                name: Some("Test Counselor".into()),
                availability_schedule: Some(weekly_schedule(day_spec)),
                current_availability: Some(true),
            },
        )
        .unwrap();
    counselor_id
}

pub fn weekly_schedule(day_spec: &str) -> AvailabilitySchedule {
    let days = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    AvailabilitySchedule(
        days.iter()
            .map(|day| (day.to_string(), day_spec.to_string()))
            .collect(),
    )
}

pub struct MockBookingBackendInner {
    pub success: AtomicBool,
    pub slot_taken: AtomicBool,
    pub insert_conflicts: AtomicBool,
    pub calls_to_counselors: AtomicU64,
    pub calls_to_counselor: AtomicU64,
    pub calls_to_update_profile: AtomicU64,
    pub calls_to_booked_start_times: AtomicU64,
    pub calls_to_has_scheduled_appointment: AtomicU64,
    pub calls_to_insert_appointment: AtomicU64,
    pub calls_to_appointments_for_counselor: AtomicU64,
    pub calls_to_update_status: AtomicU64,
    pub counselors: Mutex<HashMap<Uuid, CounselorProfile>>,
    pub booked: Mutex<Vec<NaiveDateTime>>,
}

/// Counts calls and returns canned answers.
#[derive(Clone)]
pub struct MockBookingBackend(pub Arc<MockBookingBackendInner>);

impl MockBookingBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            slot_taken: AtomicBool::new(false),
            insert_conflicts: AtomicBool::new(false),
            calls_to_counselors: AtomicU64::default(),
            calls_to_counselor: AtomicU64::default(),
            calls_to_update_profile: AtomicU64::default(),
            calls_to_booked_start_times: AtomicU64::default(),
            calls_to_has_scheduled_appointment: AtomicU64::default(),
            calls_to_insert_appointment: AtomicU64::default(),
            calls_to_appointments_for_counselor: AtomicU64::default(),
            calls_to_update_status: AtomicU64::default(),
            counselors: Mutex::default(),
            booked: Mutex::default(),
        }
    }
}

impl MockBookingBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingBackendInner::new()))
    }

    pub fn add_counselor(&self, day_spec: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.0.counselors.lock().unwrap().insert(
            user_id,
            CounselorProfile {
                user_id,
                name: "Mock Counselor".into(),
                availability_schedule: weekly_schedule(day_spec),
                current_availability: true,
            },
        );
        user_id
    }

    pub fn storage_calls(&self) -> u64 {
        [
            &self.0.calls_to_counselors,
            &self.0.calls_to_counselor,
            &self.0.calls_to_update_profile,
            &self.0.calls_to_booked_start_times,
            &self.0.calls_to_has_scheduled_appointment,
            &self.0.calls_to_insert_appointment,
            &self.0.calls_to_appointments_for_counselor,
            &self.0.calls_to_update_status,
        ]
        .iter()
        .map(|calls| calls.load(Ordering::SeqCst))
        .sum()
    }

    fn result(&self) -> Result<()> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BookingError::Storage("Supposed to fail".into())),
        }
    }
}

impl BookingBackend for MockBookingBackend {
    fn counselors(&self) -> Result<Vec<CounselorProfile>> {
        self.0.calls_to_counselors.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.counselors.lock().unwrap().values().cloned().collect())
    }

    fn counselor(&self, counselor_id: Uuid) -> Result<Option<CounselorProfile>> {
        self.0.calls_to_counselor.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.counselors.lock().unwrap().get(&counselor_id).cloned())
    }

    fn update_profile(
        &self,
        counselor_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<CounselorProfile> {
        self.0.calls_to_update_profile.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let mut profile = CounselorProfile {
            user_id: counselor_id,
            name: String::new(),
            availability_schedule: AvailabilitySchedule::default(),
            current_availability: false,
        };
        update.apply(&mut profile)?;
        Ok(profile)
    }

    fn booked_start_times(
        &self,
        _counselor_id: Uuid,
        _date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>> {
        self.0
            .calls_to_booked_start_times
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.booked.lock().unwrap().clone())
    }

    fn has_scheduled_appointment(
        &self,
        _counselor_id: Uuid,
        _start_time: NaiveDateTime,
    ) -> Result<bool> {
        self.0
            .calls_to_has_scheduled_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.slot_taken.load(Ordering::SeqCst))
    }

    fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        self.0
            .calls_to_insert_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        if self.0.insert_conflicts.load(Ordering::SeqCst) {
            return Err(BookingError::SlotAlreadyBooked);
        }
        Ok(appointment)
    }

    fn appointments_for_counselor(&self, _counselor_id: Uuid) -> Result<Vec<Appointment>> {
        self.0
            .calls_to_appointments_for_counselor
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(vec![])
    }

    fn update_status(
        &self,
        appointment_id: Uuid,
        _status: AppointmentStatus,
    ) -> Result<Appointment> {
        self.0.calls_to_update_status.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Err(BookingError::AppointmentNotFound(appointment_id))
    }
}
