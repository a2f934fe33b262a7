// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod envelope;
pub mod session;

pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionSecret, PASSWORD_KEY,
    PAT_KEY,
};
pub use session::TrailSession;
