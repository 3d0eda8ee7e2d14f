//! Spaced-repetition boost: concepts left alone longer get picked more often.

use chrono::NaiveDate;

/// Multiplier for a concept last practised `days` ago.
pub fn multiplier_for_days(days: i64) -> f64 {
    match days {
        ..=0 => 1.0,
        1 => 1.2,
        2 => 1.5,
        3 => 1.8,
        _ => 2.0,
    }
}

/// Whole days between `last` and `today`. Never-practised concepts return `None`.
pub fn days_since(last: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    last.map(|d| (today - d).num_days())
}

/// Multiplier for a concept given its last practice date; never practised
/// counts as long ago, a future date as today.
pub fn multiplier(last: Option<NaiveDate>, today: NaiveDate) -> f64 {
    match days_since(last, today) {
        Some(days) => multiplier_for_days(days),
        None => multiplier_for_days(i64::MAX),
    }
}
