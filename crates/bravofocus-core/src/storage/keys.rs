//! Key names in the key/value store.

use chrono::NaiveDate;

pub const EXPERIENCE: &str = "timerExperience";
pub const LEVEL: &str = "timerLevel";
/// JSON array of sticker strings.
pub const STICKERS: &str = "timerStickers";
pub const THEME: &str = "timerTheme";
pub const SOUND: &str = "timerSound";
/// JSON-encoded session, persisted by the CLI between invocations.
pub const SESSION: &str = "timerSession";

pub const STUDY_TIME_PREFIX: &str = "studyTime_";

/// `studyTime_<YYYY-MM-DD>`
pub fn study_time(day: NaiveDate) -> String {
    format!("{STUDY_TIME_PREFIX}{}", day.format("%Y-%m-%d"))
}

/// Inverse of [`study_time`].
pub fn study_day(key: &str) -> Option<NaiveDate> {
    let date = key.strip_prefix(STUDY_TIME_PREFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
