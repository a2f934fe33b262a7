// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store with the same CAS semantics as the GitHub store.
//!
//! Clones share state, so two sessions built on clones of one store behave
//! like two browser tabs writing the same remote file.

use crate::error::{AppError, Result};
use crate::models::{CasToken, Principal, RemoteResource};
use crate::store::ResourceStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[derive(Clone)]
struct StoredResource {
    content: Vec<u8>,
    token: CasToken,
    revision: u64,
}

impl StoredResource {
    fn new(content: &[u8], revision: u64) -> Self {
        // Mixing in the revision makes every write produce a fresh token,
        // even when the content is unchanged.
        let mut hasher = Sha256::new();
        hasher.update(revision.to_be_bytes());
        hasher.update(content);
        let token = CasToken::new(hex::encode(hasher.finalize()));

        Self {
            content: content.to_vec(),
            token,
            revision,
        }
    }
}

/// Memory-backed [`ResourceStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// credential -> login
    accounts: Arc<DashMap<String, String>>,
    /// login -> resource
    resources: Arc<DashMap<String, StoredResource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential that authenticates as `login`.
    pub fn with_account(self, credential: &str, login: &str) -> Self {
        self.accounts
            .insert(credential.to_string(), login.to_string());
        self
    }

    /// Current raw content for `login`, bypassing the CAS protocol.
    pub fn content(&self, login: &str) -> Option<Vec<u8>> {
        self.resources.get(login).map(|r| r.content.clone())
    }

    /// Current token for `login`.
    pub fn token(&self, login: &str) -> Option<CasToken> {
        self.resources.get(login).map(|r| r.token.clone())
    }

    /// Number of successful writes for `login`.
    pub fn revision(&self, login: &str) -> u64 {
        self.resources.get(login).map(|r| r.revision).unwrap_or(0)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn authenticate(&self, credential: &str) -> Result<Principal> {
        let login = self
            .accounts
            .get(credential)
            .map(|l| l.clone())
            .ok_or(AppError::InvalidCredential)?;
        Ok(Principal::new(login, credential))
    }

    async fn read_resource(&self, principal: &Principal) -> Result<RemoteResource> {
        Ok(self
            .resources
            .get(&principal.login)
            .map(|r| RemoteResource::present(r.content.clone(), r.token.clone()))
            .unwrap_or_else(RemoteResource::absent))
    }

    async fn write_resource(
        &self,
        principal: &Principal,
        content: &[u8],
        token: Option<&CasToken>,
    ) -> Result<CasToken> {
        // The entry guard holds the shard lock, so check and swap are atomic.
        match self.resources.entry(principal.login.clone()) {
            Entry::Vacant(slot) => {
                if token.is_some() {
                    return Err(AppError::WriteConflict);
                }
                let stored = StoredResource::new(content, 1);
                let new_token = stored.token.clone();
                slot.insert(stored);
                Ok(new_token)
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if token != Some(&current.token) {
                    return Err(AppError::WriteConflict);
                }
                let stored = StoredResource::new(content, current.revision + 1);
                let new_token = stored.token.clone();
                slot.insert(stored);
                Ok(new_token)
            }
        }
    }
}
