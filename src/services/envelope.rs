// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password-based envelope encryption for the progress record.
//!
//! Envelope layout (then standard base64):
//!
//! ```text
//! salt (16) | nonce (12) | AES-256-GCM ciphertext | tag (16)
//! ```
//!
//! The key is PBKDF2-HMAC-SHA256(password, salt, 100_000 iterations). Salt
//! and nonce are drawn fresh for every call, so a (key, nonce) pair is never
//! reused. These constants are part of the wire format.

use crate::error::{AppError, Result};
use crate::models::UserRecord;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;
use validator::Validate;
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = NONCE_LEN;
pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// Encrypt a record under `password`. Returns the base64 envelope.
pub fn encrypt(record: &UserRecord, password: &str) -> Result<String> {
    let plaintext = serde_json::to_vec(record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Record serialization failed: {}", e)))?;

    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rng.fill(&mut salt)
        .and_then(|_| rng.fill(&mut iv))
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;

    let key = derive_key(password, &salt)?;

    let mut envelope = Vec::with_capacity(HEADER_LEN + plaintext.len() + TAG_LEN);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&iv);

    let mut in_out = plaintext;
    key.seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("AES-GCM seal failed")))?;
    envelope.extend_from_slice(&in_out);

    Ok(BASE64.encode(envelope))
}

/// Decrypt a base64 envelope produced by [`encrypt`].
///
/// A wrong password and a tampered envelope both surface as
/// [`AppError::WrongPasswordOrCorrupted`]; the GCM tag cannot tell them apart.
pub fn decrypt(envelope_b64: &str, password: &str) -> Result<UserRecord> {
    let bytes = BASE64
        .decode(envelope_b64.trim())
        .map_err(|e| AppError::MalformedEnvelope(format!("Base64 decode failed: {}", e)))?;

    if bytes.len() < HEADER_LEN {
        return Err(AppError::MalformedEnvelope(format!(
            "Envelope is {} bytes, need at least {}",
            bytes.len(),
            HEADER_LEN
        )));
    }

    let (salt, rest) = bytes.split_at(SALT_LEN);
    let (iv, sealed) = rest.split_at(IV_LEN);

    let key = derive_key(password, salt)?;
    let nonce = Nonce::try_assume_unique_for_key(iv)
        .map_err(|_| AppError::MalformedEnvelope("Bad nonce length".to_string()))?;

    let mut in_out = Zeroizing::new(sealed.to_vec());
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| AppError::WrongPasswordOrCorrupted)?;

    serde_json::from_slice(plaintext)
        .map_err(|e| AppError::MalformedPayload(format!("JSON parse error: {}", e)))
}

/// Check the password shape before it is used as KDF input.
///
/// A UX guard only: it keeps typos like an empty field out, it does not
/// make weak passwords safe.
pub fn validate_password(password: &str) -> Result<()> {
    PasswordInput { password }.validate()?;
    Ok(())
}

#[derive(Validate)]
struct PasswordInput<'a> {
    #[validate(length(min = 8, message = "Parool peab olema vähemalt 8 tähemärki pikk"))]
    password: &'a str,
}

fn derive_key(password: &str, salt: &[u8]) -> Result<LessSafeKey> {
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PBKDF2 iterations must be > 0")))?;

    let mut key_bytes = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password.as_bytes(),
        &mut key_bytes[..],
    );

    let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes[..])
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid AES-256 key length")))?;
    Ok(LessSafeKey::new(unbound))
}
