// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with localized user messages.

/// Application error type shared by the codec, the stores and the session.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Wrong password or corrupted data")]
    WrongPasswordOrCorrupted,

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Write conflict: remote resource changed since last read")]
    WriteConflict,

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Reason attached to read/write failures caused by API rate limiting.
    pub const RATE_LIMITED: &'static str = "rate limited";

    /// Whether the session stays usable and the user can simply try again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AppError::MalformedEnvelope(_) | AppError::MalformedPayload(_) | AppError::Internal(_)
        )
    }

    /// Whether the caller must re-read remote state before retrying.
    pub fn requires_reload(&self) -> bool {
        matches!(self, AppError::WriteConflict)
    }

    /// Whether a read/write failure was reported as rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            AppError::ReadFailed(msg) | AppError::WriteFailed(msg) => msg == Self::RATE_LIMITED,
            _ => false,
        }
    }

    /// Localized message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::InvalidCredential => "Vigane Personal Access Token".to_string(),
            AppError::NotAuthenticated => "Pole sisse logitud".to_string(),
            AppError::MalformedEnvelope(_) | AppError::MalformedPayload(_) => {
                "Salvestatud andmed on rikutud".to_string()
            }
            AppError::WrongPasswordOrCorrupted => "Vale parool".to_string(),
            AppError::ReadFailed(_) => "Andmete laadimine ebaõnnestus".to_string(),
            AppError::WriteFailed(_) => "Andmete salvestamine ebaõnnestus".to_string(),
            AppError::WriteConflict => {
                "Andmeid on vahepeal muudetud, laadi need uuesti".to_string()
            }
            AppError::CredentialStore(_) => "Seadete salvestamine ebaõnnestus".to_string(),
            AppError::Internal(_) => "Tekkis ootamatu viga".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Keeps the first human-readable message; the form is shown one error at a time.
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        AppError::Validation(message)
    }
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, AppError>;
