use time::{OffsetDateTime, UtcOffset};

/// The local offset, or UTC when it cannot be determined (for example in a
/// multi-threaded process on some unix platforms).
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}
