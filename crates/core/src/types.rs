/// Backend identifiers for scenarios, phases, events, configurations
/// and simulations.
pub type EntityId = i64;

/// Milliseconds, either an epoch timestamp or an offset relative to a
/// configuration's scenario start time.
pub type Millis = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Convert an epoch-millisecond value into a [`Timestamp`].
///
/// Returns `None` for values outside chrono's representable range.
pub fn timestamp_from_millis(millis: Millis) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp_millis(millis)
}
