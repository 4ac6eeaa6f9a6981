use crate::schedule::TimeRange;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Length of every bookable session.
pub const SLOT_DURATION: Duration = Duration::hours(1);

/// Expands one day's open ranges into candidate start times.
///
/// Every emitted start is followed by a full `duration` inside its range;
/// a trailing window that would run past the range end is dropped. Starts
/// advance by `duration`, in range order.
pub fn generate_slots(
    date: NaiveDate,
    ranges: &[TimeRange],
    duration: Duration,
) -> Vec<NaiveDateTime> {
    if duration <= Duration::zero() {
        return vec![];
    }

    let mut slots = Vec::new();
    for range in ranges {
        let end = date.and_time(range.end);
        let mut cursor = date.and_time(range.start);
        while let Some(next) = cursor.checked_add_signed(duration) {
            if next > end {
                break;
            }
            slots.push(cursor);
            cursor = next;
        }
    }
    slots
}

pub fn format_slot(slot: &NaiveDateTime) -> String {
    slot.format("%H:%M").to_string()
}
