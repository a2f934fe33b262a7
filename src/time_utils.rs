// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch for `date`.
pub fn to_epoch_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Current instant in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    to_epoch_millis(Utc::now())
}

/// `YYYY-MM-DD` calendar date of `date` in UTC.
pub fn to_iso_date(date: DateTime<Utc>) -> String {
    date.date_naive().format("%Y-%m-%d").to_string()
}

/// Today's UTC calendar date; the default for a new completion.
pub fn today_iso_date() -> String {
    to_iso_date(Utc::now())
}
