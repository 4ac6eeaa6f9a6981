use crate::backend::BookingBackend;
use crate::error::{BookingError, Result};
use crate::schema::{appointments, counselor_profiles};
use crate::types::{
    Appointment, AppointmentStatus, AvailabilitySchedule, CounselorProfile, ProfileUpdate,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::ConnectionError;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = counselor_profiles)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CounselorRow {
    user_id: Uuid,
    name: String,
    availability_schedule: serde_json::Value,
    current_availability: bool,
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AppointmentRow {
    id: Uuid,
    counselor_user_id: Uuid,
    student_user_id: Uuid,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    mode: String,
    status: String,
}

impl TryFrom<CounselorRow> for CounselorProfile {
    type Error = BookingError;

    fn try_from(row: CounselorRow) -> Result<Self> {
        let availability_schedule: AvailabilitySchedule =
            serde_json::from_value(row.availability_schedule).map_err(|err| {
                BookingError::Storage(format!(
                    "stored schedule of {} is unreadable: {err}",
                    row.user_id
                ))
            })?;
        Ok(CounselorProfile {
            user_id: row.user_id,
            name: row.name,
            availability_schedule,
            current_availability: row.current_availability,
        })
    }
}

impl TryFrom<&CounselorProfile> for CounselorRow {
    type Error = BookingError;

    fn try_from(profile: &CounselorProfile) -> Result<Self> {
        let availability_schedule = serde_json::to_value(&profile.availability_schedule)
            .map_err(|err| BookingError::Storage(err.to_string()))?;
        Ok(CounselorRow {
            user_id: profile.user_id,
            name: profile.name.clone(),
            availability_schedule,
            current_availability: profile.current_availability,
        })
    }
}

impl From<&Appointment> for AppointmentRow {
    fn from(appointment: &Appointment) -> Self {
        AppointmentRow {
            id: appointment.id,
            counselor_user_id: appointment.counselor_id,
            student_user_id: appointment.student_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            mode: appointment.mode.as_str().into(),
            status: appointment.status.as_str().into(),
        }
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = BookingError;

    fn try_from(row: AppointmentRow) -> Result<Self> {
        let mode = row
            .mode
            .parse()
            .map_err(|_| BookingError::Storage(format!("unknown stored mode '{}'", row.mode)))?;
        Ok(Appointment {
            id: row.id,
            counselor_id: row.counselor_user_id,
            student_id: row.student_user_id,
            start_time: row.start_time,
            end_time: row.end_time,
            mode,
            status: row.status.parse()?,
        })
    }
}

impl From<DieselError> for BookingError {
    fn from(err: DieselError) -> Self {
        error!(?err, "Database operation failed");
        BookingError::Storage(err.to_string())
    }
}

/// Half-open `[start, end)` bounds of `date`. The end saturates on the last
/// representable day.
fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let day_start = date.and_time(NaiveTime::MIN);
    let day_end = day_start
        .checked_add_signed(Duration::days(1))
        .unwrap_or(NaiveDateTime::MAX);
    (day_start, day_end)
}

/// PostgreSQL backend. The partial unique index on
/// `(counselor_user_id, start_time) WHERE status = 'scheduled'` guards against
/// double bookings.
#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> std::result::Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn establish_connection(
        database_url: &str,
    ) -> std::result::Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn connection(&self) -> Result<MutexGuard<'_, PgConnection>> {
        self.connection.lock().map_err(|err| {
            error!(%err, "Database connection lock is poisoned");
            BookingError::Storage("database connection lock is poisoned".into())
        })
    }
}

impl BookingBackend for DatabaseInterface {
    fn counselors(&self) -> Result<Vec<CounselorProfile>> {
        let mut connection = self.connection()?;
        counselor_profiles::table
            .filter(counselor_profiles::current_availability.eq(true))
            .order(counselor_profiles::name.asc())
            .select(CounselorRow::as_select())
            .load::<CounselorRow>(&mut *connection)?
            .into_iter()
            .map(CounselorProfile::try_from)
            .collect()
    }

    fn counselor(&self, counselor_id: Uuid) -> Result<Option<CounselorProfile>> {
        let mut connection = self.connection()?;
        counselor_profiles::table
            .find(counselor_id)
            .select(CounselorRow::as_select())
            .first::<CounselorRow>(&mut *connection)
            .optional()?
            .map(CounselorProfile::try_from)
            .transpose()
    }

    fn update_profile(
        &self,
        counselor_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<CounselorProfile> {
        let mut connection = self.connection()?;
        connection.transaction::<_, BookingError, _>(|connection| {
            let mut profile = counselor_profiles::table
                .find(counselor_id)
                .select(CounselorRow::as_select())
                .for_update()
                .first::<CounselorRow>(connection)
                .optional()?
                .map(CounselorProfile::try_from)
                .transpose()?
                .unwrap_or_else(|| CounselorProfile {
                    user_id: counselor_id,
                    name: String::new(),
                    availability_schedule: AvailabilitySchedule::default(),
                    current_availability: false,
                });
            update.apply(&mut profile)?;

            let row = CounselorRow::try_from(&profile)?;
            diesel::insert_into(counselor_profiles::table)
                .values(&row)
                .on_conflict(counselor_profiles::user_id)
                .do_update()
                .set(&row)
                .execute(connection)?;
            Ok(profile)
        })
    }

    fn booked_start_times(
        &self,
        counselor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>> {
        let (day_start, day_end) = day_window(date);

        let mut connection = self.connection()?;
        let start_times = appointments::table
            .filter(appointments::counselor_user_id.eq(counselor_id))
            .filter(appointments::status.eq(AppointmentStatus::Scheduled.as_str()))
            .filter(appointments::start_time.ge(day_start))
            .filter(appointments::start_time.lt(day_end))
            .order(appointments::start_time.asc())
            .select(appointments::start_time)
            .load::<NaiveDateTime>(&mut *connection)?;
        Ok(start_times)
    }

    fn has_scheduled_appointment(
        &self,
        counselor_id: Uuid,
        start_time: NaiveDateTime,
    ) -> Result<bool> {
        let mut connection = self.connection()?;
        let exists = diesel::select(diesel::dsl::exists(
            appointments::table
                .filter(appointments::counselor_user_id.eq(counselor_id))
                .filter(appointments::start_time.eq(start_time))
                .filter(appointments::status.eq(AppointmentStatus::Scheduled.as_str())),
        ))
        .get_result::<bool>(&mut *connection)?;
        Ok(exists)
    }

    fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment> {
        let row = AppointmentRow::from(&appointment);
        let mut connection = self.connection()?;
        let result = connection.transaction::<AppointmentRow, DieselError, _>(|connection| {
            diesel::insert_into(appointments::table)
                .values(&row)
                .returning(AppointmentRow::as_returning())
                .get_result(connection)
        });

        match result {
            Ok(row) => Appointment::try_from(row),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, details)) => {
                info!(
                    constraint = details.constraint_name(),
                    counselor_id = %appointment.counselor_id,
                    start_time = %appointment.start_time,
                    "Insert rejected by uniqueness constraint"
                );
                Err(BookingError::SlotAlreadyBooked)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn appointments_for_counselor(&self, counselor_id: Uuid) -> Result<Vec<Appointment>> {
        let mut connection = self.connection()?;
        appointments::table
            .filter(appointments::counselor_user_id.eq(counselor_id))
            .order(appointments::start_time.asc())
            .select(AppointmentRow::as_select())
            .load::<AppointmentRow>(&mut *connection)?
            .into_iter()
            .map(Appointment::try_from)
            .collect()
    }

    fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let mut connection = self.connection()?;
        connection.transaction::<_, BookingError, _>(|connection| {
            let row = appointments::table
                .find(appointment_id)
                .select(AppointmentRow::as_select())
                .for_update()
                .first::<AppointmentRow>(connection)
                .optional()?
                .ok_or(BookingError::AppointmentNotFound(appointment_id))?;

            let mut appointment = Appointment::try_from(row)?;
            appointment.transition(status)?;

            diesel::update(appointments::table.find(appointment_id))
                .set(appointments::status.eq(status.as_str()))
                .execute(connection)?;
            Ok(appointment)
        })
    }
}
