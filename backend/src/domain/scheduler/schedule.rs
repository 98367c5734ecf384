//! Recurrence rules for scheduled jobs, evaluated in UTC.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Utc, Weekday};

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// At fixed intervals aligned to the Unix epoch, so an hourly job fires
    /// on the hour.
    Every(TimeDelta),
    /// Once a day at the given wall-clock time.
    DailyAt(NaiveTime),
    /// Once a week on `weekday` at `time`.
    WeeklyAt { weekday: Weekday, time: NaiveTime },
}

impl Schedule {
    /// Hourly, on the hour.
    pub fn hourly() -> Self {
        Self::Every(TimeDelta::hours(1))
    }

    /// Every `minutes` minutes.
    pub fn every_minutes(minutes: i64) -> Self {
        Self::Every(TimeDelta::minutes(minutes))
    }

    /// Daily at `hour:minute`; out-of-range values fall back to midnight.
    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self::DailyAt(wall_clock(hour, minute))
    }

    /// Weekly on `weekday` at `hour:minute`.
    pub fn weekly_at(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self::WeeklyAt {
            weekday,
            time: wall_clock(hour, minute),
        }
    }

    /// The first fire time strictly after `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use podium::domain::scheduler::Schedule;
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 3, 11, 0, 30, 0).unwrap();
    /// let next = Schedule::daily_at(1, 0).next_after(now);
    /// assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0).unwrap());
    /// ```
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::Every(interval) => next_interval(now, interval),
            Self::DailyAt(time) => {
                let today = now.date_naive().and_time(time).and_utc();
                if today > now {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
            Self::WeeklyAt { weekday, time } => {
                let ahead = (7 + i64::from(weekday.num_days_from_monday())
                    - i64::from(now.weekday().num_days_from_monday()))
                    % 7;
                let candidate =
                    now.date_naive().and_time(time).and_utc() + TimeDelta::days(ahead);
                if candidate > now {
                    candidate
                } else {
                    candidate + TimeDelta::weeks(1)
                }
            }
        }
    }
}

fn wall_clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn next_interval(now: DateTime<Utc>, interval: TimeDelta) -> DateTime<Utc> {
    let step = interval.num_seconds().max(1);
    let elapsed = now.timestamp();
    let next = (elapsed.div_euclid(step) + 1) * step;
    DateTime::from_timestamp(next, 0).unwrap_or(now + TimeDelta::seconds(step))
}
