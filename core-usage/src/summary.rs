//! Conversion of raw quota numbers into display-ready values.

use crate::error::{Result, UsageError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Display-ready usage values for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Share of the quota consumed, rounded to whole percent.
    pub used_percentage: u32,
    /// Consumed volume label, e.g. "12.48 GB".
    pub used_volume: String,
    /// Total quota label, e.g. "40 GB".
    pub initial_volume: String,
    /// Humanized remaining period, absent when the quota names no end date.
    pub remaining_time: Option<String>,
}

impl UsageSummary {
    /// Build a summary from raw quota amounts.
    ///
    /// Amounts arrive in the provider's unit, which is one hundred-thousandth
    /// of a gigabyte. `period_end` is compared against `now` for the
    /// remaining-time label; an end date already in the past humanizes to
    /// "Now".
    pub fn from_quota(
        used_amount: i64,
        initial_amount: i64,
        period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if initial_amount == 0 {
            return Err(UsageError::EmptyQuota);
        }

        let used_percentage =
            (used_amount as f64 / initial_amount as f64 * 100.0).round() as u32;
        let remaining_time =
            period_end.map(|end| humanize_duration(DurationParts::between(now, end)));

        Ok(Self {
            used_percentage,
            used_volume: format_gigabytes(used_amount),
            initial_volume: format_gigabytes(initial_amount),
            remaining_time,
        })
    }
}

/// Format a raw amount as a gigabyte label.
///
/// The value is rounded to two decimals; trailing zeros are not printed, so
/// full gigabytes come out as "40 GB" rather than "40.00 GB".
pub fn format_gigabytes(amount: i64) -> String {
    let gigabytes = (amount as f64 / 10000.0).round() / 100.0;
    format!("{} GB", gigabytes)
}

/// A duration decomposed into calendar-ish units.
///
/// Months are counted as 30 days and years as 365; billing periods are short
/// enough that the approximation never shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl DurationParts {
    /// Decompose the span from `now` to `end`, clamping past end dates to
    /// zero.
    pub fn between(now: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_duration(end - now)
    }

    pub fn from_duration(duration: Duration) -> Self {
        let total_seconds = duration.num_seconds().max(0);

        let total_days = total_seconds / 86_400;
        let years = total_days / 365;
        let months = (total_days % 365) / 30;
        let days = (total_days % 365) % 30;

        let rest = total_seconds % 86_400;
        let hours = rest / 3_600;
        let minutes = (rest % 3_600) / 60;
        let seconds = rest % 60;

        Self {
            years,
            months,
            days,
            hours,
            minutes,
            seconds,
        }
    }
}

/// Humanize a decomposed duration, most significant unit first.
///
/// Seconds are only shown when nothing larger is left; a fully elapsed
/// duration reads "Now".
pub fn humanize_duration(parts: DurationParts) -> String {
    if parts.years > 0 {
        return format!(
            "{} years {} months {} days {} hours {} minutes",
            parts.years, parts.months, parts.days, parts.hours, parts.minutes
        );
    }
    if parts.months > 0 {
        return format!(
            "{} months {} days {} hours {} minutes",
            parts.months, parts.days, parts.hours, parts.minutes
        );
    }
    if parts.days > 0 {
        return format!(
            "{} days {} hours {} minutes",
            parts.days, parts.hours, parts.minutes
        );
    }
    if parts.hours > 0 {
        return format!("{} hours {} minutes", parts.hours, parts.minutes);
    }
    if parts.minutes > 0 {
        return format!("{} minutes", parts.minutes);
    }
    if parts.seconds > 0 {
        return format!("{} seconds", parts.seconds);
    }
    "Now".to_string()
}
