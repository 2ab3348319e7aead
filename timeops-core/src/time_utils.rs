pub const SECONDS_PER_DAY: i64 = 86_400;
pub const WEEK: i64 = 7 * SECONDS_PER_DAY;

// the unix epoch fell on a Thursday
const DAYS_FROM_EPOCH_TO_MONDAY: i64 = 3;

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Timezone offset in seconds, positive west of UTC. Added to a UTC-aligned
/// boundary it yields the same local wall-clock boundary; sent in the
/// `X-UTC-Offset` header for server-side date bucketing.
pub fn utc_offset_seconds() -> i64 {
    -i64::from(chrono::Local::now().offset().local_minus_utc())
}

/// Most recent Monday midnight in the given timezone, as UTC epoch seconds.
/// Anchor for week bucketing.
pub fn week_start(now_utc: i64, utc_offset: i64) -> i64 {
    now_utc - (now_utc % WEEK) - DAYS_FROM_EPOCH_TO_MONDAY * SECONDS_PER_DAY + utc_offset
}

/// `H:MM:SS` with unpadded hours, used for bucket duration summaries.
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// `H:MM` with unpadded hours, used for the weekly total.
pub fn format_week_hours(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}:{:02}", hours, minutes)
}

/// Zero-padded `HH:MM:SS`, used for the running-entry elapsed display.
pub fn format_elapsed(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
