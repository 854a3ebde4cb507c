//! KadminStore integration tests against scripted stand-ins for the admin
//! tool.
//!
//! Each test writes a small shell script that plays the part of
//! `kadmin.local`: capturing its argv, printing canned diagnostics on the
//! error stream, exiting with a chosen status, or hanging. That exercises the
//! real process plumbing (spawn, capture, deadline, kill) without a KDC.

#![cfg(all(unix, feature = "kadmin"))]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use kk_common::config::KadminConfig;
use kk_common::Credential;
use kk_store::error::{ALREADY_EXISTS_PHRASE, NOT_FOUND_PHRASE};
use kk_store::{KadminStore, PrincipalStore, StoreError};
use tempfile::TempDir;

fn write_stub(dir: &Path, body: &str) -> String {
    let path = dir.join("kadmin-stub.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path.to_str().unwrap().to_string()
}

fn store_for(tool: String) -> KadminStore {
    KadminStore::new(&KadminConfig {
        path: tool,
        timeout_secs: 5,
    })
}

/// Stub that records its argv into `argv_path` and exits cleanly.
fn argv_capture_stub(dir: &Path) -> (String, PathBuf) {
    let argv_path = dir.join("argv");
    let tool = write_stub(
        dir,
        &format!("printf '%s' \"$*\" > \"{}\"", argv_path.display()),
    );
    (tool, argv_path)
}

#[tokio::test]
async fn test_create_sends_subcommand_credential_and_principal() {
    let dir = TempDir::new().unwrap();
    let (tool, argv_path) = argv_capture_stub(dir.path());
    let store = store_for(tool);

    store
        .create("alice@EXAMPLE.LOCAL", &Credential::RandomKey, None)
        .await
        .unwrap();

    let argv = fs::read_to_string(argv_path).unwrap();
    assert_eq!(argv, "add_principal -randkey alice@EXAMPLE.LOCAL");
}

#[tokio::test]
async fn test_create_orders_attributes_before_credential_flags() {
    let dir = TempDir::new().unwrap();
    let (tool, argv_path) = argv_capture_stub(dir.path());
    let store = store_for(tool);

    store
        .create(
            "alice/admin@EXAMPLE.LOCAL",
            &Credential::Password("abc".into()),
            Some("+needchange"),
        )
        .await
        .unwrap();

    let argv = fs::read_to_string(argv_path).unwrap();
    assert_eq!(argv, "add_principal +needchange -pw abc alice/admin@EXAMPLE.LOCAL");
}

#[tokio::test]
async fn test_delete_sends_principal_only() {
    let dir = TempDir::new().unwrap();
    let (tool, argv_path) = argv_capture_stub(dir.path());
    let store = store_for(tool);

    store.delete("bob").await.unwrap();

    let argv = fs::read_to_string(argv_path).unwrap();
    assert_eq!(argv, "delprinc bob");
}

#[tokio::test]
async fn test_change_password_sends_credential_and_principal() {
    let dir = TempDir::new().unwrap();
    let (tool, argv_path) = argv_capture_stub(dir.path());
    let store = store_for(tool);

    store
        .change_password("alice", &Credential::Password("secret".into()))
        .await
        .unwrap();

    let argv = fs::read_to_string(argv_path).unwrap();
    assert_eq!(argv, "change_password -pw secret alice");
}

#[tokio::test]
async fn test_create_classifies_already_exists() {
    let dir = TempDir::new().unwrap();
    let tool = write_stub(
        dir.path(),
        &format!("echo 'add_principal: {ALREADY_EXISTS_PHRASE} \"alice@EXAMPLE.LOCAL\".' >&2"),
    );
    let store = store_for(tool);

    let error = store
        .create("alice@EXAMPLE.LOCAL", &Credential::RandomKey, None)
        .await
        .unwrap_err();

    assert!(matches!(error, StoreError::AlreadyExists(ref p) if p == "alice@EXAMPLE.LOCAL"));
}

#[tokio::test]
async fn test_delete_classifies_missing_principal() {
    let dir = TempDir::new().unwrap();
    let tool = write_stub(
        dir.path(),
        &format!("echo 'delete_principal: {NOT_FOUND_PHRASE} \"bob@EXAMPLE.LOCAL\".' >&2"),
    );
    let store = store_for(tool);

    let error = store.delete("bob").await.unwrap_err();

    assert!(matches!(error, StoreError::NotFound(ref p) if p == "bob"));
}

#[tokio::test]
async fn test_create_surfaces_other_diagnostics_verbatim() {
    let dir = TempDir::new().unwrap();
    let tool = write_stub(
        dir.path(),
        "echo 'add_principal: Operation requires ``add`` privilege while creating \"alice\".' >&2",
    );
    let store = store_for(tool);

    let error = store
        .create("alice", &Credential::RandomKey, None)
        .await
        .unwrap_err();

    match error {
        StoreError::Diagnostic(text) => {
            // Verbatim, trailing newline included.
            assert_eq!(
                text,
                "add_principal: Operation requires ``add`` privilege while creating \"alice\".\n"
            );
        }
        other => panic!("expected Diagnostic, got {other:?}"),
    }
}

#[tokio::test]
async fn test_change_password_ignores_the_already_exists_phrase() {
    // Even if the tool somehow emitted the create-idempotency phrase on a
    // password change, change must stay a hard failure.
    let dir = TempDir::new().unwrap();
    let tool = write_stub(
        dir.path(),
        &format!("echo '{ALREADY_EXISTS_PHRASE}' >&2"),
    );
    let store = store_for(tool);

    let error = store
        .change_password("alice", &Credential::RandomKey)
        .await
        .unwrap_err();

    assert!(matches!(error, StoreError::Diagnostic(_)));
}

#[tokio::test]
async fn test_silent_nonzero_exit_is_reported() {
    let dir = TempDir::new().unwrap();
    let tool = write_stub(dir.path(), "exit 3");
    let store = store_for(tool);

    let error = store.delete("bob").await.unwrap_err();

    assert!(matches!(error, StoreError::Exit { .. }));
}

#[tokio::test]
async fn test_stdout_noise_does_not_affect_the_outcome() {
    // The tool chats on stdout (prompts, confirmations); only stderr counts.
    let dir = TempDir::new().unwrap();
    let tool = write_stub(dir.path(), "echo 'Principal \"bob\" deleted.'");
    let store = store_for(tool);

    store.delete("bob").await.unwrap();
}

#[tokio::test]
async fn test_missing_tool_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let tool = dir.path().join("no-such-tool").display().to_string();
    let store = store_for(tool);

    let error = store.delete("bob").await.unwrap_err();

    assert!(matches!(error, StoreError::Spawn { .. }));
}

#[tokio::test]
async fn test_hung_tool_times_out() {
    let dir = TempDir::new().unwrap();
    let tool = write_stub(dir.path(), "sleep 30");
    let store = KadminStore::new(&KadminConfig {
        path: tool,
        timeout_secs: 1,
    });

    let error = store
        .create("alice", &Credential::RandomKey, None)
        .await
        .unwrap_err();

    match error {
        StoreError::Timeout { ref target, .. } => {
            assert!(target.ends_with("kadmin-stub.sh"));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}
