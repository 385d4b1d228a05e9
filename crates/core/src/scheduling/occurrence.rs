//! Next-fire-time arithmetic on local wall-clock time.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use medalarm_domain::{MedAlarmError, Result};

/// Next `hour:minute` strictly after `now`.
///
/// A target equal to `now` counts as passed and rolls to the next day.
pub fn next_occurrence(now: DateTime<Local>, hour: u8, minute: u8) -> Result<DateTime<Local>> {
    let today = now.date_naive();
    let candidate = at_local(today, hour, minute)?;
    if candidate > now {
        return Ok(candidate);
    }
    at_local(following_day(today)?, hour, minute)
}

fn following_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt().ok_or_else(|| MedAlarmError::Internal(format!("no day after {date}")))
}

fn at_local(date: NaiveDate, hour: u8, minute: u8) -> Result<DateTime<Local>> {
    let naive = date.and_hms_opt(u32::from(hour), u32::from(minute), 0).ok_or_else(|| {
        MedAlarmError::InvalidInput(format!("invalid alarm time {hour:02}:{minute:02}"))
    })?;
    resolve_local(naive)
}

// Ambiguous times (clocks falling back) take the first instance; times in a
// spring-forward gap move to the first valid minute after it.
fn resolve_local(naive: NaiveDateTime) -> Result<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(time) => Ok(time),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => (1..=180)
            .find_map(|offset| {
                Local.from_local_datetime(&(naive + Duration::minutes(offset))).earliest()
            })
            .ok_or_else(|| {
                MedAlarmError::Internal(format!("local time {naive} cannot be represented"))
            }),
    }
}
