// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use matkarajad_sync::config::Config;
use matkarajad_sync::models::{CompletionEntry, UserRecord};
use matkarajad_sync::services::{MemoryCredentialStore, TrailSession};
use matkarajad_sync::store::{GitHubStore, MemoryStore};

pub const TEST_PAT: &str = "ghp_test_token";
pub const TEST_LOGIN: &str = "mari";
pub const TEST_PASSWORD: &str = "correcthorse";

/// Contents API path for the default config and `TEST_LOGIN`.
#[allow(dead_code)]
pub const CONTENTS_PATH: &str = "/repos/mari/Matkarajad/contents/data/user-data.json.encrypted";

/// The record used by the end-to-end scenarios.
#[allow(dead_code)]
pub fn sample_record() -> UserRecord {
    let mut record = UserRecord::default();
    record.mark_completed(
        "trail-1",
        CompletionEntry {
            date: "2024-05-01".to_string(),
            comment: String::new(),
            timestamp: 1714521600000,
        },
    );
    record
}

/// Memory store with one registered account.
#[allow(dead_code)]
pub fn test_store() -> MemoryStore {
    MemoryStore::new().with_account(TEST_PAT, TEST_LOGIN)
}

/// Session over a clone of `store`; returns the credential store handle too.
#[allow(dead_code)]
pub fn test_session(store: &MemoryStore) -> (TrailSession<MemoryStore>, MemoryCredentialStore) {
    let credentials = MemoryCredentialStore::new();
    let session = TrailSession::new(store.clone(), Box::new(credentials.clone()));
    (session, credentials)
}

/// Session that is connected and unlocked with the test password.
#[allow(dead_code)]
pub async fn unlocked_session(store: &MemoryStore) -> TrailSession<MemoryStore> {
    let (mut session, _) = test_session(store);
    session.connect(TEST_PAT).await.expect("connect");
    session
        .unlock(TEST_PASSWORD, false)
        .await
        .expect("unlock");
    session
}

/// GitHub store pointed at a mock server.
#[allow(dead_code)]
pub fn github_store(server_uri: &str) -> GitHubStore {
    GitHubStore::new(&Config::with_api_url(server_uri)).expect("Failed to build GitHub store")
}
