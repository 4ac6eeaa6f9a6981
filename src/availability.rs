//! Open-slot queries: schedule → candidate slots → minus booked start times.

use crate::backend::BookingBackend;
use crate::error::{BookingError, Result};
use crate::slots::{generate_slots, SLOT_DURATION};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Removes every booked start time from `candidates`, keeping candidate order.
pub fn resolve(candidates: &[NaiveDateTime], booked: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let booked: HashSet<&NaiveDateTime> = booked.iter().collect();
    candidates
        .iter()
        .filter(|candidate| !booked.contains(candidate))
        .copied()
        .collect()
}

/// Parses an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::InvalidDate(format!("'{date}' is not a YYYY-MM-DD date")))
}

pub fn available_slots<B: BookingBackend>(
    backend: &B,
    counselor_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<NaiveDateTime>> {
    let counselor = backend
        .counselor(counselor_id)?
        .ok_or(BookingError::CounselorNotFound(counselor_id))?;

    let ranges = counselor
        .availability_schedule
        .ranges_for(date.weekday())?;
    let candidates = generate_slots(date, &ranges, SLOT_DURATION);
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let booked = backend.booked_start_times(counselor_id, date)?;
    let available = resolve(&candidates, &booked);
    debug!(
        %counselor_id,
        %date,
        candidates = candidates.len(),
        available = available.len(),
        "Resolved availability"
    );
    Ok(available)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::local_backend::LocalBackend;
    use crate::slots::format_slot;
    use crate::testutils::{example_counselor, MockBookingBackend};
    use std::sync::atomic::Ordering;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 22)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 22).unwrap()
    }

    #[test]
    fn test_resolve_removes_booked() {
        let candidates = [at(9, 0), at(10, 0), at(11, 0)];
        let available = resolve(&candidates, &[at(10, 0)]);
        assert_eq!(available, vec![at(9, 0), at(11, 0)]);
    }

    #[test]
    fn test_resolve_ignores_unknown_booked_times() {
        let candidates = [at(9, 0), at(10, 0)];
        let available = resolve(&candidates, &[at(9, 30), at(17, 0)]);
        assert_eq!(available, candidates);
    }

    #[test]
    fn test_resolve_everything_booked() {
        let candidates = [at(9, 0), at(10, 0)];
        assert!(resolve(&candidates, &candidates).is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-09-22").unwrap(), monday());
        assert!(matches!(
            parse_date("22.09.2025"),
            Err(BookingError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("2025-02-30"),
            Err(BookingError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_available_slots_for_unknown_counselor() {
        let backend = LocalBackend::default();
        let counselor_id = Uuid::new_v4();
        assert_eq!(
            available_slots(&backend, counselor_id, monday()).unwrap_err(),
            BookingError::CounselorNotFound(counselor_id)
        );
    }

    #[test]
    fn test_available_slots_is_stable_without_bookings() {
        let backend = LocalBackend::default();
        let counselor = example_counselor(&backend, "09:00-12:00");

        let first = available_slots(&backend, counselor, monday()).unwrap();
        let second = available_slots(&backend, counselor, monday()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(format_slot).collect::<Vec<_>>(),
            ["09:00", "10:00", "11:00"]
        );
    }

    #[test]
    fn test_available_slots_on_last_representable_day() {
        let backend = LocalBackend::default();
        let counselor = example_counselor(&backend, "21:00-23:59");
        let date = parse_date(&NaiveDate::MAX.format("%Y-%m-%d").to_string()).unwrap();
        assert_eq!(date, NaiveDate::MAX);

        let slots = available_slots(&backend, counselor, date).unwrap();
        assert_eq!(
            slots.iter().map(format_slot).collect::<Vec<_>>(),
            ["21:00", "22:00"]
        );
    }

    #[test]
    fn test_day_off_skips_appointment_lookup() {
        let mock_backend = MockBookingBackend::new();
        let counselor = mock_backend.add_counselor("off");

        let slots = available_slots(&mock_backend, counselor, monday()).unwrap();
        assert!(slots.is_empty());
        assert_eq!(
            mock_backend.0.calls_to_booked_start_times.load(Ordering::SeqCst),
            0
        );
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mock_backend = MockBookingBackend::new();
        let counselor = mock_backend.add_counselor("09:00-12:00");
        mock_backend.0.success.store(false, Ordering::SeqCst);

        assert!(matches!(
            available_slots(&mock_backend, counselor, monday()),
            Err(BookingError::Storage(_))
        ));
    }
}
