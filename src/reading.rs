//! Describes a single stored observation.

use chrono::prelude::*;

/// Seconds between two collection ticks.
pub const TICK_INTERVAL_SECS: i64 = 15 * 60;

/// One observation: the occupancy count at a tick boundary, optionally
/// enriched with the weather at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Timestamp aligned to the tick boundary. Unique within the store.
    pub timestamp: DateTime<Local>,

    /// Occupancy reported by the source.
    pub occupancy_count: u32,

    /// Temperature in the configured unit system, if the enrichment succeeded.
    pub temperature: Option<f64>,

    /// Rain over the previous hour in millimetres, if the enrichment succeeded.
    pub precipitation: Option<f64>,
}

/// Rounds the timestamp to the nearest tick boundary (:00, :15, :30 or :45),
/// so that an invocation slightly off the mark still lands on the intended one.
pub fn align_to_tick(timestamp: DateTime<Local>) -> DateTime<Local> {
    let aligned = (timestamp.timestamp() + TICK_INTERVAL_SECS / 2).div_euclid(TICK_INTERVAL_SECS)
        * TICK_INTERVAL_SECS;
    DateTime::from_timestamp(aligned, 0)
        .map(|aligned| aligned.with_timezone(&Local))
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 2, 12, hour, minute, second).unwrap()
    }

    #[test]
    fn boundary_is_kept() {
        assert_eq!(align_to_tick(local(14, 15, 0)), local(14, 15, 0));
    }

    #[test]
    fn late_invocation_rounds_down() {
        assert_eq!(align_to_tick(local(14, 15, 42)), local(14, 15, 0));
        assert_eq!(align_to_tick(local(14, 22, 29)), local(14, 15, 0));
    }

    #[test]
    fn early_invocation_rounds_up() {
        assert_eq!(align_to_tick(local(14, 14, 31)), local(14, 15, 0));
        assert_eq!(align_to_tick(local(14, 7, 30)), local(14, 15, 0));
    }

    #[test]
    fn day_boundary_rounds_into_the_next_day() {
        let aligned = align_to_tick(local(23, 55, 1));
        assert_eq!(
            aligned,
            Local.with_ymd_and_hms(2026, 2, 13, 0, 0, 0).unwrap()
        );
    }
}
