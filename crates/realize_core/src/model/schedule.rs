use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// A calendar entry. It serializes with RFC 3339 timestamps but has no
/// `Deserialize` impl: stored events come back through
/// [`crate::storage::ScheduleCodec`], which revives the timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    pub is_all_day: bool,
}

fn day_start(day: Date, offset: UtcOffset) -> OffsetDateTime {
    day.midnight().assume_offset(offset)
}

/// Events starting on `day` in the given offset, in stored order.
pub fn events_for_day(
    events: &[ScheduleEvent],
    day: Date,
    offset: UtcOffset,
) -> Vec<&ScheduleEvent> {
    let from = day_start(day, offset);
    let until = from + Duration::days(1);
    events
        .iter()
        .filter(|event| event.start >= from && event.start < until)
        .collect()
}

/// Events from the start of today through the Saturday closing next week,
/// sorted by start.
pub fn upcoming_events(events: &[ScheduleEvent], now: OffsetDateTime) -> Vec<&ScheduleEvent> {
    let today = now.date();
    let from = day_start(today, now.offset());
    let days_to_saturday = 6 - i64::from(today.weekday().number_days_from_sunday());
    let until = from + Duration::days(days_to_saturday + 7);

    let mut selected: Vec<&ScheduleEvent> = events
        .iter()
        .filter(|event| event.start >= from && event.start <= until)
        .collect();
    selected.sort_by_key(|event| event.start);
    selected
}
