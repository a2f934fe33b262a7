// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trail progress session.
//!
//! A [`TrailSession`] owns everything one signed-in user has: the verified
//! principal, the data password, the decrypted record and the CAS token of
//! the remote version that record came from. It drives the full cycle:
//!
//! 1. `connect` (or `resume`) verifies the GitHub credential
//! 2. `unlock` reads the blob and decrypts it, or writes a fresh record
//! 3. `mark_completed` / `remove_completion` encrypt and write with the token
//! 4. `logout` forgets all of it
//!
//! Mutations are applied to a copy and only adopted once the store has
//! accepted the write, so a failed save never shows up as saved progress.

use crate::error::{AppError, Result};
use crate::models::{CasToken, CompletionEntry, CompletionForm, Principal, UserRecord};
use crate::services::credentials::{CredentialStore, SessionSecret, PASSWORD_KEY, PAT_KEY};
use crate::services::envelope;
use crate::store::ResourceStore;
use crate::time_utils::{now_millis, today_iso_date};

/// Session context for one user and one remote record.
pub struct TrailSession<S: ResourceStore> {
    store: S,
    credentials: Box<dyn CredentialStore>,
    principal: Option<Principal>,
    secret: Option<SessionSecret>,
    record: UserRecord,
    token: Option<CasToken>,
}

impl<S: ResourceStore> TrailSession<S> {
    pub fn new(store: S, credentials: Box<dyn CredentialStore>) -> Self {
        Self {
            store,
            credentials,
            principal: None,
            secret: None,
            record: UserRecord::default(),
            token: None,
        }
    }

    // ─── Authentication ──────────────────────────────────────────

    /// Re-verify a credential saved by an earlier session.
    ///
    /// Returns `Ok(false)` when nothing is stored or the store no longer
    /// accepts it; the caller then shows the token prompt.
    pub async fn resume(&mut self) -> Result<bool> {
        let Some(credential) = self.credentials.get(PAT_KEY)? else {
            return Ok(false);
        };

        match self.store.authenticate(&credential).await {
            Ok(principal) => {
                tracing::info!(login = %principal.login, "Resumed stored credential");
                self.adopt_principal(principal)?;
                Ok(true)
            }
            Err(AppError::InvalidCredential) => {
                tracing::info!("Stored credential was rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Verify a freshly entered credential and remember it.
    pub async fn connect(&mut self, credential: &str) -> Result<()> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AppError::Validation(
                "Palun sisesta Personal Access Token".to_string(),
            ));
        }

        let principal = self.store.authenticate(credential).await?;
        self.credentials.set(PAT_KEY, credential)?;

        tracing::info!(login = %principal.login, "Credential verified and stored");
        self.adopt_principal(principal)
    }

    /// Switch to `principal`. Unlocked state and a remembered password
    /// belong to the previous login and are dropped when the login changes.
    fn adopt_principal(&mut self, principal: Principal) -> Result<()> {
        let previous = self.principal.as_ref().map(|p| p.login.clone());
        match previous {
            Some(login) if login == principal.login => {}
            Some(login) => {
                tracing::info!(
                    from = %login,
                    to = %principal.login,
                    "Account switched, locking session"
                );
                self.clear_unlocked();
                self.credentials.remove(PASSWORD_KEY)?;
            }
            None => self.clear_unlocked(),
        }
        self.principal = Some(principal);
        Ok(())
    }

    fn clear_unlocked(&mut self) {
        self.secret = None;
        self.record = UserRecord::default();
        self.token = None;
    }

    /// Load (or create) the progress record with `password`.
    ///
    /// With `remember`, the password is saved to the credential store in
    /// plaintext; without it any previously saved password is removed.
    pub async fn unlock(&mut self, password: &str, remember: bool) -> Result<()> {
        envelope::validate_password(password)?;
        let principal = self.principal.as_ref().ok_or(AppError::NotAuthenticated)?;
        let secret = SessionSecret::new(password);

        let remote = self.store.read_resource(principal).await?;

        let (record, token) = match remote.content {
            Some(content) => (open(content, secret.clone()).await?, remote.token),
            None => {
                tracing::info!(login = %principal.login, "No remote record, creating one");
                let record = UserRecord::default();
                let sealed = seal(record.clone(), secret.clone()).await?;
                let token = self
                    .store
                    .write_resource(principal, sealed.as_bytes(), None)
                    .await?;
                (record, Some(token))
            }
        };

        if remember {
            self.credentials.set(PASSWORD_KEY, secret.expose())?;
        } else {
            self.credentials.remove(PASSWORD_KEY)?;
        }

        tracing::info!(
            login = %principal.login,
            completed = record.completed_count(),
            "Session unlocked"
        );

        self.record = record;
        self.token = token;
        self.secret = Some(secret);
        Ok(())
    }

    /// Password saved by an earlier `unlock(.., true)`, for pre-filling the prompt.
    pub fn remembered_password(&self) -> Result<Option<SessionSecret>> {
        Ok(self
            .credentials
            .get(PASSWORD_KEY)?
            .map(|p| SessionSecret::new(&p)))
    }

    /// Forget the principal, password, record and token, locally and in the
    /// credential store.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(principal) = self.principal.take() {
            tracing::info!(login = %principal.login, "Logged out");
        }
        self.clear_unlocked();

        let pat = self.credentials.remove(PAT_KEY);
        let password = self.credentials.remove(PASSWORD_KEY);
        pat.and(password)
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Mark a trail completed (or overwrite its completion) and save.
    pub async fn mark_completed(&mut self, trail_id: &str, form: CompletionForm) -> Result<()> {
        self.ensure_unlocked()?;
        let trail_id = normalize_trail_id(trail_id)?;
        let entry = form.into_entry(now_millis())?;

        let mut candidate = self.record.clone();
        candidate.mark_completed(trail_id, entry);
        self.commit(candidate).await?;

        tracing::info!(trail_id, "Trail marked completed");
        Ok(())
    }

    /// Remove a trail's completion and save.
    ///
    /// Returns `false` without writing when the trail was not completed.
    pub async fn remove_completion(&mut self, trail_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        let trail_id = normalize_trail_id(trail_id)?;
        if !self.record.is_completed(trail_id) {
            return Ok(false);
        }

        let mut candidate = self.record.clone();
        candidate.remove_completion(trail_id);
        self.commit(candidate).await?;

        tracing::info!(trail_id, "Trail completion removed");
        Ok(true)
    }

    /// Re-read and re-decrypt the remote record, adopting its token.
    ///
    /// The recovery step after [`AppError::WriteConflict`]: local unsaved
    /// changes are dropped and the caller replays its mutation.
    pub async fn reload(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        let principal = self.principal.as_ref().ok_or(AppError::NotAuthenticated)?;
        let secret = self.secret.clone().ok_or(AppError::NotAuthenticated)?;

        let remote = self.store.read_resource(principal).await?;
        let record = match remote.content {
            Some(content) => open(content, secret).await?,
            None => UserRecord::default(),
        };

        tracing::info!(
            login = %principal.login,
            completed = record.completed_count(),
            "Record reloaded"
        );
        self.record = record;
        self.token = remote.token;
        Ok(())
    }

    /// Encrypt `candidate`, write it against the current token, and adopt it
    /// only once the store has accepted it.
    async fn commit(&mut self, candidate: UserRecord) -> Result<()> {
        let principal = self.principal.as_ref().ok_or(AppError::NotAuthenticated)?;
        let secret = self.secret.clone().ok_or(AppError::NotAuthenticated)?;

        let sealed = seal(candidate.clone(), secret).await?;
        let token = self
            .store
            .write_resource(principal, sealed.as_bytes(), self.token.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Save failed, keeping previous record");
                e
            })?;

        self.record = candidate;
        self.token = Some(token);
        Ok(())
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.principal.is_some() && self.secret.is_some() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub fn username(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.login.as_str())
    }

    pub fn is_connected(&self) -> bool {
        self.principal.is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        self.ensure_unlocked().is_ok()
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    pub fn is_completed(&self, trail_id: &str) -> bool {
        self.record.is_completed(trail_id)
    }

    pub fn completion(&self, trail_id: &str) -> Option<&CompletionEntry> {
        self.record.completion(trail_id)
    }

    pub fn completed_count(&self) -> usize {
        self.record.completed_count()
    }

    /// Token of the remote version the in-memory record matches.
    pub fn cas_token(&self) -> Option<&CasToken> {
        self.token.as_ref()
    }

    /// Pre-filled completion form: the existing entry, or today with no comment.
    pub fn completion_form(&self, trail_id: &str) -> CompletionForm {
        match self.record.completion(trail_id) {
            Some(entry) => CompletionForm::new(entry.date.clone(), entry.comment.clone()),
            None => CompletionForm::new(today_iso_date(), ""),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn normalize_trail_id(trail_id: &str) -> Result<&str> {
    let trail_id = trail_id.trim();
    if trail_id.is_empty() {
        return Err(AppError::Validation("Raja tunnus puudub".to_string()));
    }
    Ok(trail_id)
}

/// Encrypt on the blocking pool; PBKDF2 is deliberately slow.
async fn seal(record: UserRecord, secret: SessionSecret) -> Result<String> {
    tokio::task::spawn_blocking(move || envelope::encrypt(&record, secret.expose()))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Encryption task failed: {}", e)))?
}

/// Decrypt stored bytes on the blocking pool.
async fn open(content: Vec<u8>, secret: SessionSecret) -> Result<UserRecord> {
    let text = String::from_utf8(content)
        .map_err(|_| AppError::MalformedEnvelope("Stored envelope is not UTF-8".to_string()))?;

    tokio::task::spawn_blocking(move || envelope::decrypt(&text, secret.expose()))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Decryption task failed: {}", e)))?
}
