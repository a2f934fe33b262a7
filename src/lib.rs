// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Matkarajad sync: encrypted, versioned trail progress for Eesti Matkarajad
//!
//! This crate keeps a hiker's "completed trails" record encrypted under a
//! password and stores it as a single file in a GitHub repository the hiker
//! owns, using the file's blob SHA as a compare-and-swap token.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::TrailSession;
pub use store::{GitHubStore, MemoryStore, ResourceStore};
