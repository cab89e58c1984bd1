//! Lateness rules.
//!
//! Arrival times travel through the system as "HH:MM" strings and are
//! only ever interpreted here. All values are in the school's local
//! civil time; there is no timezone handling anywhere in the engine.

/// Converts a clock string to minutes since midnight.
///
/// Reads the first two characters as hours and characters 3-4 as
/// minutes, so trailing seconds ("06:45:12") are ignored. An empty
/// string parses to 0: a missing time means midnight, not an error,
/// and callers must not read that as "on time". There is no range
/// validation; "99:99" degrades silently to 6039.
#[must_use]
pub fn time_to_minutes(s: &str) -> u32 {
    let raw = s.trim();
    if raw.is_empty() {
        return 0;
    }
    let Some(hours) = clock_component(raw, 0, 2) else {
        return 0;
    };
    let Some(minutes) = clock_component(raw, 3, 5) else {
        return 0;
    };
    hours * 60 + minutes
}

/// Reads a numeric component from `raw[start..end]`, clamped to the
/// string length. An absent or empty slice counts as 0; a slice that
/// fails to parse makes the whole clock string unreadable.
fn clock_component(raw: &str, start: usize, end: usize) -> Option<u32> {
    if start >= raw.len() {
        return Some(0);
    }
    let slice = raw.get(start..end.min(raw.len()))?;
    let slice = slice.trim();
    if slice.is_empty() {
        return Some(0);
    }
    slice.parse().ok()
}

/// Minutes late relative to the cutoff. Never negative: arriving early
/// or on time is 0.
#[must_use]
pub fn late_minutes(arrival: &str, cutoff: &str) -> u32 {
    time_to_minutes(arrival).saturating_sub(time_to_minutes(cutoff))
}

/// Formats a minute count for humans: "45 minutes", "1 hour",
/// "1 hour 30 minutes". Negative input clamps to 0.
#[must_use]
pub fn format_duration(minutes: i64) -> String {
    let total = minutes.max(0);
    if total < 60 {
        return format!("{total} {}", unit("minute", total));
    }
    let hours = total / 60;
    let rest = total % 60;
    if rest == 0 {
        format!("{hours} {}", unit("hour", hours))
    } else {
        format!("{hours} {} {rest} {}", unit("hour", hours), unit("minute", rest))
    }
}

fn unit(name: &str, count: i64) -> String {
    if count == 1 {
        name.to_string()
    } else {
        format!("{name}s")
    }
}
