// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod record;
pub mod resource;

pub use record::{CompletionEntry, CompletionForm, UserRecord, RECORD_VERSION};
pub use resource::{CasToken, Principal, RemoteResource};
