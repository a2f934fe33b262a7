// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local credential persistence and the in-memory session secret.
//!
//! The bearer credential is always persisted so a returning user skips the
//! token prompt. The data password is persisted only when the user asks for
//! it, and then in plaintext: whoever can read the credential store can
//! decrypt the progress record. Hosts that need better should implement
//! [`CredentialStore`] over an OS keychain.

use crate::config::Config;
use crate::error::{AppError, Result};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

/// Storage key for the GitHub personal access token.
pub const PAT_KEY: &str = "matkarajad_pat";
/// Storage key for the remembered data password.
pub const PASSWORD_KEY: &str = "matkarajad_password";

/// Opaque string key-value store that survives between sessions.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Data password held for the lifetime of an unlocked session.
///
/// Zeroed on drop; never printed.
#[derive(Clone)]
pub struct SessionSecret(Zeroizing<String>);

impl SessionSecret {
    pub fn new(password: &str) -> Self {
        Self(Zeroizing::new(password.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Process-local store; contents vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    values: Arc<DashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON file of key -> value, rewritten on every change.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `config.credential_file`, if one is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.credential_file.as_ref().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AppError::CredentialStore(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            AppError::CredentialStore(format!("Corrupt {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::CredentialStore(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::CredentialStore(e.to_string()))?;

        // Readers only ever see a complete file.
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, json.as_bytes())
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                AppError::CredentialStore(format!("Failed to write {}: {}", self.path.display(), e))
            })
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AppError::CredentialStore("Credential file lock poisoned".to_string()))?;
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

/// Create `path` afresh, readable and writable by the owner only.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}
