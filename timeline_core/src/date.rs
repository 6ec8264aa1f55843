//! Dates, precision tags and the year-float world coordinate
//!
//! The master canvas works in "float years" (1985.5 is roughly July 1985),
//! lanes work in calendar dates. The conversions here are exact on January 1st
//! of every year so a lane clipped to `[1920.0, 1930.0]` lands on
//! `1920-01-01`/`1930-01-01` without drift.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::DateError;

/// How much of a date the source record actually specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Day,
    Month,
    Year,
}

/// A date as it appears in a raw record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// A bare year number such as `1985`
    Year(i64),
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    Text(String),
    /// A calendar date value supplied by the host
    Calendar(NaiveDate),
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        RawDate::Text(s.to_string())
    }
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        RawDate::Calendar(date)
    }
}

/// A parsed item date together with its precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemDate {
    pub value: NaiveDate,
    pub precision: DatePrecision,
}

impl ItemDate {
    pub fn new(value: NaiveDate, precision: DatePrecision) -> Self {
        Self { value, precision }
    }

    /// Midnight at the start of the date
    pub fn datetime(&self) -> NaiveDateTime {
        self.value.and_time(NaiveTime::MIN)
    }

    pub fn year_float(&self) -> f64 {
        date_to_year_float(self.datetime())
    }
}

/// Parse a raw record date, inferring its precision from the form supplied
pub fn parse_raw_date(raw: &RawDate) -> Result<ItemDate, DateError> {
    match raw {
        RawDate::Year(year) => {
            let value = i32::try_from(*year)
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
                .ok_or(DateError::YearOutOfRange(*year))?;
            Ok(ItemDate::new(value, DatePrecision::Year))
        }
        RawDate::Text(text) => parse_date_text(text),
        RawDate::Calendar(date) => Ok(ItemDate::new(*date, DatePrecision::Day)),
    }
}

/// Parse `YYYY-MM-DD`, then `YYYY-MM`, then `YYYY`, first match wins
pub fn parse_date_text(text: &str) -> Result<ItemDate, DateError> {
    let trimmed = text.trim();

    if let Ok(value) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(ItemDate::new(value, DatePrecision::Day));
    }

    if let Ok(value) = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d") {
        return Ok(ItemDate::new(value, DatePrecision::Month));
    }

    let is_year = !trimmed.is_empty()
        && trimmed.len() <= 4
        && trimmed.chars().all(|c| c.is_ascii_digit());
    if is_year {
        if let Some(value) = trimmed
            .parse::<i32>()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        {
            return Ok(ItemDate::new(value, DatePrecision::Year));
        }
    }

    Err(DateError::Unparseable(text.to_string()))
}

fn year_bounds(year: i32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_time(NaiveTime::MIN);
    let next = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?.and_time(NaiveTime::MIN);
    Some((start, next))
}

/// Convert a date-time to a float year
pub fn date_to_year_float(dt: NaiveDateTime) -> f64 {
    let year = dt.year();
    match year_bounds(year) {
        Some((start, next)) => {
            let span = (next - start).num_milliseconds() as f64;
            let into = (dt - start).num_milliseconds() as f64;
            year as f64 + into / span
        }
        // Last representable year, no successor to measure against
        None => year as f64 + dt.ordinal0() as f64 / 366.0,
    }
}

/// Convert a float year back to a date-time, rounded to the millisecond
///
/// Returns `None` for non-finite input or years chrono cannot represent.
pub fn year_float_to_date(year_float: f64) -> Option<NaiveDateTime> {
    if !year_float.is_finite() {
        return None;
    }
    let year = year_float.floor();
    if year < i32::MIN as f64 || year > i32::MAX as f64 {
        return None;
    }
    let (start, next) = year_bounds(year as i32)?;
    let span = (next - start).num_milliseconds() as f64;
    let millis = ((year_float - year) * span).round() as i64;
    Some(start + Duration::milliseconds(millis))
}

/// Tick and label style, picked from how many pixels one year occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Zoomed out: a tick every ten years, items labeled by year
    Decades,
    /// Zoomed in: yearly ticks, items labeled by their own precision
    Years,
}

impl LabelStyle {
    /// Pixels per year at which the next style kicks in
    const PIXELS_PER_STEP: f64 = 50.0;

    pub fn for_pixels_per_year(pixels_per_year: f64) -> Self {
        let step = (pixels_per_year / Self::PIXELS_PER_STEP).floor();
        if step >= 1.0 {
            LabelStyle::Years
        } else {
            LabelStyle::Decades
        }
    }

    pub fn tick_every_years(&self) -> i32 {
        match self {
            LabelStyle::Decades => 10,
            LabelStyle::Years => 1,
        }
    }

    /// Label for an item on the event axis
    pub fn format(&self, date: &ItemDate) -> String {
        match self {
            LabelStyle::Decades => format_year(date.value),
            LabelStyle::Years => format_smart(date),
        }
    }
}

pub fn format_year(date: NaiveDate) -> String {
    date.format("%Y").to_string()
}

/// Full month name when it is short (`March`), otherwise abbreviated (`Sep`)
pub fn format_month(date: NaiveDate) -> String {
    let long = date.format("%B").to_string();
    if long.len() <= 5 {
        long
    } else {
        date.format("%b").to_string()
    }
}

pub fn format_month_day(date: NaiveDate) -> String {
    date.format("%b %e").to_string()
}

/// Label a date according to the precision it was recorded with
pub fn format_smart(date: &ItemDate) -> String {
    match date.precision {
        DatePrecision::Day => format_month_day(date.value),
        DatePrecision::Month => format_month(date.value),
        DatePrecision::Year => format_year(date.value),
    }
}
