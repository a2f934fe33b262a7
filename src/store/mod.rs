// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Versioned remote storage for the encrypted progress blob.
//!
//! Every store holds at most one resource per principal and guards writes
//! with a compare-and-swap token: a write must present the token of the
//! current version, or no token when nothing has been written yet.

pub mod github;
pub mod memory;

pub use github::GitHubStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{CasToken, Principal, RemoteResource};
use async_trait::async_trait;

/// A remote document store with optimistic concurrency.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Check a bearer credential and resolve who it belongs to.
    ///
    /// Any failure, including transport errors, is
    /// [`AppError::InvalidCredential`](crate::error::AppError::InvalidCredential).
    async fn authenticate(&self, credential: &str) -> Result<Principal>;

    /// Fetch the current content and its token.
    ///
    /// A missing resource is not an error: it returns
    /// [`RemoteResource::absent`].
    async fn read_resource(&self, principal: &Principal) -> Result<RemoteResource>;

    /// Replace the resource if `token` still names its current version
    /// (or, with `None`, only if it does not exist yet). Returns the token
    /// of the version just written.
    async fn write_resource(
        &self,
        principal: &Principal,
        content: &[u8],
        token: Option<&CasToken>,
    ) -> Result<CasToken>;
}
