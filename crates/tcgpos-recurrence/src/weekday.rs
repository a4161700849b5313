//! Weekday short names shared by the formatter and the rule builder.

/// Cron day-of-week index (0 = Sunday) to Japanese short weekday name.
pub const DAY_NAMES: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Resolve a cron day-of-week value to its short name.
///
/// Both `0` and `7` resolve to Sunday. Values above 7 have no name.
#[must_use]
pub fn day_name(day_of_week: u32) -> Option<&'static str> {
    match day_of_week {
        7 => Some(DAY_NAMES[0]),
        d => DAY_NAMES.get(d as usize).copied(),
    }
}

/// Position of a short name in canonical week order (Sunday first).
#[must_use]
pub fn week_position(name: &str) -> Option<usize> {
    DAY_NAMES.iter().position(|n| *n == name)
}
