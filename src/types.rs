use crate::error::{BookingError, Result};
use crate::schedule::{parse_day_spec, TimeRange};
use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use uuid::Uuid;
use validator::Validate;

const WEEKDAY_NAMES: [(Weekday, &str); 7] = [
    (Weekday::Mon, "monday"),
    (Weekday::Tue, "tuesday"),
    (Weekday::Wed, "wednesday"),
    (Weekday::Thu, "thursday"),
    (Weekday::Fri, "friday"),
    (Weekday::Sat, "saturday"),
    (Weekday::Sun, "sunday"),
];

fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize].1
}

/// Weekly availability of a counselor, keyed by weekday name
/// (e.g. `"monday": "09:00-12:00,14:00-17:00"`). Missing days are off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilitySchedule(pub BTreeMap<String, String>);

impl AvailabilitySchedule {
    pub fn day_spec(&self, weekday: Weekday) -> &str {
        let name = weekday_name(weekday);
        self.0
            .iter()
            .find(|(day, _)| day.eq_ignore_ascii_case(name))
            .map(|(_, spec)| spec.as_str())
            .unwrap_or("")
    }

    pub fn ranges_for(&self, weekday: Weekday) -> Result<Vec<TimeRange>> {
        parse_day_spec(self.day_spec(weekday))
    }

    /// Checks that every key names a weekday exactly once and every day spec parses.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::new();
        for (day, spec) in &self.0 {
            let Some((weekday, _)) = WEEKDAY_NAMES
                .iter()
                .find(|(_, name)| day.eq_ignore_ascii_case(name))
            else {
                return Err(BookingError::InvalidScheduleFormat(format!(
                    "'{day}' is not a weekday"
                )));
            };
            if seen.contains(weekday) {
                return Err(BookingError::InvalidScheduleFormat(format!(
                    "'{day}' is listed more than once"
                )));
            }
            seen.push(*weekday);
            parse_day_spec(spec)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounselorProfile {
    pub user_id: Uuid,
    pub name: String,
    pub availability_schedule: AvailabilitySchedule,
    pub current_availability: bool,
}

/// The mutable fields of a counselor profile. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub availability_schedule: Option<AvailabilitySchedule>,
    pub current_availability: Option<bool>,
}

impl ProfileUpdate {
    /// Applies the update onto `profile`, validating the schedule first.
    pub fn apply(self, profile: &mut CounselorProfile) -> Result<()> {
        if let Some(schedule) = &self.availability_schedule {
            schedule.validate()?;
        }
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(schedule) = self.availability_schedule {
            profile.availability_schedule = schedule;
        }
        if let Some(current_availability) = self.current_availability {
            profile.current_availability = current_availability;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentMode {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "in-person")]
    InPerson,
}

impl AppointmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentMode::Online => "online",
            AppointmentMode::InPerson => "in-person",
        }
    }
}

impl FromStr for AppointmentMode {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(AppointmentMode::Online),
            "in-person" => Ok(AppointmentMode::InPerson),
            _ => Err(BookingError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (
                AppointmentStatus::Scheduled,
                AppointmentStatus::Cancelled | AppointmentStatus::Completed
            )
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(BookingError::Storage(format!("unknown appointment status '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    #[serde(rename = "counselor_user_id")]
    pub counselor_id: Uuid,
    #[serde(rename = "student_user_id")]
    pub student_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub mode: AppointmentMode,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn transition(&mut self, next: AppointmentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
