//! # Date Resolution Module
//!
//! ## Purpose
//! Turns free-form date tokens from the query string into concrete calendar
//! dates, classifying each as the current day or not. The classification
//! drives cache TTL selection downstream.
//!
//! ## Input/Output Specification
//! - **Input**: Optional raw token (`today`, `tomorrow`, `2026-08-22`, ...)
//!   plus the reference day it is resolved against
//! - **Output**: `ResolvedDate` carrying the date and its freshness
//! - **Errors**: `InvalidDate` when no keyword or supported format matches
//!
//! Resolution is deterministic and side-effect free; callers supply the
//! reference day, so tests never depend on the wall clock.

use crate::errors::{LookupError, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

/// Whether a resolved date is the caller's current day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Today,
    NotToday,
}

/// A date token resolved against a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub freshness: Freshness,
}

impl ResolvedDate {
    pub fn is_today(&self) -> bool {
        self.freshness == Freshness::Today
    }
}

/// Datetime formats tried before the date-only ones; the time of day is
/// parsed and discarded
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date formats in attempt order. ISO forms come first; slashed and dashed
/// day/month orders are ambiguous, and month-first wins for them
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y%m%d",
];

/// Current day in UTC, the reference used by production callers
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve a date token against the given reference day.
///
/// Absent or blank tokens and the keyword `today` resolve to the reference
/// day itself; `yesterday` and `tomorrow` shift it by one day. Anything else
/// goes through the permissive format list. Freshness is decided by equality
/// with the reference, so an explicit token naming the current day still
/// counts as today.
pub fn resolve(token: Option<&str>, reference: NaiveDate) -> Result<ResolvedDate> {
    let trimmed = token.map(str::trim).filter(|t| !t.is_empty());

    let date = match trimmed {
        None => reference,
        Some(t) if t.eq_ignore_ascii_case("today") => reference,
        Some(t) if t.eq_ignore_ascii_case("yesterday") => reference
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| out_of_range(t))?,
        Some(t) if t.eq_ignore_ascii_case("tomorrow") => reference
            .checked_add_days(Days::new(1))
            .ok_or_else(|| out_of_range(t))?,
        Some(t) => parse_permissive(t).ok_or_else(|| LookupError::InvalidDate {
            token: t.to_string(),
            details: "no supported format matched".to_string(),
        })?,
    };

    let freshness = if date == reference {
        Freshness::Today
    } else {
        Freshness::NotToday
    };

    Ok(ResolvedDate { date, freshness })
}

/// Try every supported format in order, returning the first match.
fn parse_permissive(token: &str) -> Option<NaiveDate> {
    // Zoned timestamps keep their civil date as written, no conversion
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(token, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(token, format) {
            return Some(date);
        }
    }

    None
}

fn out_of_range(token: &str) -> LookupError {
    LookupError::InvalidDate {
        token: token.to_string(),
        details: "shifted date out of calendar range".to_string(),
    }
}
