//! Shared helpers: bearer extraction and subscription date math.

use axum::http::HeaderMap;
use chrono::{Days, Months, NaiveDate, Utc};

use crate::error::{AppError, Result};

/// Extract a Bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// A subscription's date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SubscriptionWindow {
    /// Compute the window for a purchase.
    ///
    /// `previous_end` is the member's latest subscription end date, if any.
    /// A renewal starts the day after an unexpired subscription ends; a
    /// lapsed member starts today like a new one.
    pub fn compute(
        today: NaiveDate,
        previous_end: Option<NaiveDate>,
        months: Option<u32>,
        custom_days: Option<u32>,
    ) -> Result<Self> {
        let start = match previous_end {
            Some(end) if end >= today => end
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::Internal("Date overflow".into()))?,
            _ => today,
        };

        let end = match (months, custom_days) {
            (Some(m), None) => start
                .checked_add_months(Months::new(m))
                .ok_or_else(|| AppError::Internal("Date overflow".into()))?,
            (None, Some(d)) => start
                .checked_add_days(Days::new(d as u64))
                .ok_or_else(|| AppError::Internal("Date overflow".into()))?,
            _ => {
                return Err(AppError::Validation(
                    "Provide either months or customDays".into(),
                ))
            }
        };

        Ok(Self { start, end })
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Internal(format!("Invalid stored date: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_member_starts_today() {
        let w = SubscriptionWindow::compute(d("2025-06-01"), None, Some(3), None).unwrap();
        assert_eq!(w.start, d("2025-06-01"));
        assert_eq!(w.end, d("2025-09-01"));
    }

    #[test]
    fn renewal_starts_day_after_active_end() {
        let w = SubscriptionWindow::compute(
            d("2025-06-15"),
            Some(d("2025-06-30")),
            Some(1),
            None,
        )
        .unwrap();
        assert_eq!(w.start, d("2025-07-01"));
        assert_eq!(w.end, d("2025-08-01"));
    }

    #[test]
    fn lapsed_member_starts_today() {
        let w = SubscriptionWindow::compute(
            d("2025-06-15"),
            Some(d("2025-01-31")),
            Some(2),
            None,
        )
        .unwrap();
        assert_eq!(w.start, d("2025-06-15"));
    }

    #[test]
    fn custom_days_window() {
        let w = SubscriptionWindow::compute(d("2025-06-01"), None, None, Some(90)).unwrap();
        assert_eq!(w.end, d("2025-08-30"));
    }
}
