/// Seconds shown to the user for a remaining time.
///
/// Rounds up, so the display only drops a second once the remaining time has
/// fully crossed the boundary and never reads `00:00` while time is left.
pub fn display_seconds(remaining_ms: u64) -> u64 {
    remaining_ms.div_ceil(1000)
}

/// `MM:SS`, minutes zero-padded to at least two digits.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
