//! Display helpers for track lists and the progress readout.

use std::time::Duration;

/// Format a duration as `m:ss`, with unpadded minutes.
///
/// Zero renders as `0:00`; sub-second remainders are truncated.
pub fn format_time(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Format an optional duration, rendering unknown as `0:00`.
pub fn format_optional_time(duration: Option<Duration>) -> String {
    format_time(duration.unwrap_or_default())
}
