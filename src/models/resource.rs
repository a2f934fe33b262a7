// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote resource snapshots and version tokens.

use std::fmt;
use zeroize::Zeroizing;

/// Compare-and-swap token: the store's identifier for one exact version
/// of the resource (a blob SHA on GitHub).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CasToken(String);

impl CasToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of reading the resource.
///
/// `content` and `token` are both `None` when the resource has never been
/// written, and both `Some` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteResource {
    pub content: Option<Vec<u8>>,
    pub token: Option<CasToken>,
}

impl RemoteResource {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(content: Vec<u8>, token: CasToken) -> Self {
        Self {
            content: Some(content),
            token: Some(token),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.content.is_none()
    }
}

/// An authenticated caller: the identity the store reported plus the bearer
/// credential used for subsequent requests.
#[derive(Clone)]
pub struct Principal {
    /// Account login; also the owner of the data repository
    pub login: String,
    credential: Zeroizing<String>,
}

impl Principal {
    pub fn new(login: impl Into<String>, credential: &str) -> Self {
        Self {
            login: login.into(),
            credential: Zeroizing::new(credential.to_string()),
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("login", &self.login)
            .field("credential", &"<redacted>")
            .finish()
    }
}
