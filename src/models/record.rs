// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plaintext progress record carried inside the encrypted envelope.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Current schema tag written into every record.
pub const RECORD_VERSION: u32 = 1;

/// A user's personal trail progress.
///
/// Never leaves the process unencrypted. Field names match the JSON that
/// existing envelopes contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserRecord {
    pub version: u32,
    /// Trail ID -> completion. Key presence is what "completed" means.
    #[serde(default)]
    pub completed_trails: BTreeMap<String, CompletionEntry>,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            completed_trails: BTreeMap::new(),
        }
    }
}

impl UserRecord {
    pub fn is_completed(&self, trail_id: &str) -> bool {
        self.completed_trails.contains_key(trail_id)
    }

    pub fn completion(&self, trail_id: &str) -> Option<&CompletionEntry> {
        self.completed_trails.get(trail_id)
    }

    /// Insert or overwrite the completion for a trail.
    pub fn mark_completed(&mut self, trail_id: impl Into<String>, entry: CompletionEntry) {
        self.completed_trails.insert(trail_id.into(), entry);
    }

    /// Returns true if the trail was previously completed.
    pub fn remove_completion(&mut self, trail_id: &str) -> bool {
        self.completed_trails.remove(trail_id).is_some()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_trails.len()
    }
}

/// One completed trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionEntry {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Free text, may be empty
    #[serde(default)]
    pub comment: String,
    /// Creation instant in milliseconds since the Unix epoch
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp: i64,
}

/// User input for marking a trail completed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompletionForm {
    #[validate(custom(function = "validate_iso_date"))]
    pub date: String,
    /// Free text; only trimmed
    pub comment: String,
}

impl CompletionForm {
    pub fn new(date: impl Into<String>, comment: impl Into<String>) -> Self {
        let date: String = date.into();
        let comment: String = comment.into();
        Self {
            date: date.trim().to_string(),
            comment: comment.trim().to_string(),
        }
    }

    /// Validate and turn the form into an entry stamped with `timestamp`.
    pub fn into_entry(self, timestamp: i64) -> crate::error::Result<CompletionEntry> {
        self.validate()?;
        Ok(CompletionEntry {
            date: self.date,
            comment: self.comment,
            timestamp,
        })
    }
}

fn validate_iso_date(date: &str) -> Result<(), ValidationError> {
    if date.is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("Palun vali kuupäev")));
    }
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            ValidationError::new("date").with_message(Cow::Borrowed("Vigane kuupäev"))
        })
}
