//! Calendar-aligned evaluation windows (UTC)

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Window over which an alert metric is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertWindow {
    Hour,
    #[default]
    Day,
    Month,
}

impl AlertWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    /// Start of the window containing `now`
    pub fn start_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hour => start_of_day(now) + Duration::hours(now.hour() as i64),
            Self::Day => start_of_day(now),
            Self::Month => start_of_month(now),
        }
    }
}

/// Budget period of a cost alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostAlertPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl CostAlertPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Start of the period containing `now`; weeks start on Monday
    pub fn start_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Daily => start_of_day(now),
            Self::Weekly => {
                start_of_day(now) - Duration::days(now.weekday().num_days_from_monday() as i64)
            }
            Self::Monthly => start_of_month(now),
        }
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(|| start_of_day(now))
}
