//! Consecutive-hour claim streaks.

use std::collections::HashSet;

/// Length of the consecutive-hour run ending at `current_hour`.
///
/// Defined relative to "claimed through now": a wallet with no claim at
/// `current_hour` has streak 0 regardless of any historical run.
pub fn streak_from_hours(claimed_hours: &[i64], current_hour: i64) -> i64 {
    let claimed: HashSet<i64> = claimed_hours.iter().copied().collect();
    let mut streak = 0;
    let mut hour = current_hour;
    while claimed.contains(&hour) {
        streak += 1;
        hour -= 1;
    }
    streak
}
