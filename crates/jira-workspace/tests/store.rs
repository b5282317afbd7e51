//! Behavioral tests for the workspace store against a real directory.

use jira_workspace::{AuthType, NewProfile, StoreError, WorkspaceStore};
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

mod helpers {
    use super::*;

    pub async fn open() -> (TempDir, WorkspaceStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = WorkspaceStore::open(dir.path())
            .await
            .expect("Failed to open store");
        (dir, store)
    }

    pub fn cloud(name: &str, site: &str, token: &str) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            site_url: site.to_string(),
            email: Some(format!("me@{name}.io")),
            api_token: SecretString::from(token),
            auth_type: AuthType::Cloud,
        }
    }
}

use helpers::*;

#[tokio::test]
async fn test_acme_beta_scenario() {
    let (_dir, store) = open().await;

    let added = store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();
    assert!(added.activated);
    assert_eq!(store.get_active().await.unwrap().name, "acme");

    let added = store
        .add(cloud("beta", "beta.atlassian.net", "beta-token-0002"))
        .await
        .unwrap();
    assert!(!added.activated);
    assert_eq!(store.get_active().await.unwrap().name, "acme");

    let switched = store.switch("beta").await.unwrap();
    assert!(!switched.already_active);
    assert_eq!(store.get_active().await.unwrap().name, "beta");

    let creds = store.credentials(None).await.unwrap();
    assert_eq!(creds.site_url, "https://beta.atlassian.net");
    assert_eq!(creds.credentials.token.expose_secret(), "beta-token-0002");

    let removed = store.remove("beta").await.unwrap();
    assert!(removed.was_active);
    assert!(matches!(
        store.get_active().await,
        Err(StoreError::NoActiveWorkspace)
    ));

    let names: Vec<String> = store.list().await.into_iter().map(|w| w.name).collect();
    assert_eq!(names, vec!["acme"]);
}

#[tokio::test]
async fn test_duplicate_add_leaves_existing_untouched() {
    let (_dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "original-token-1"))
        .await
        .unwrap();

    let err = store
        .add(cloud("acme", "other.atlassian.net", "replacement-tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref n) if n == "acme"));

    let profile = store.profile(Some("acme")).await.unwrap();
    assert_eq!(profile.site_url, "https://acme.atlassian.net");
    assert_eq!(profile.api_token.expose_secret(), "original-token-1");
}

#[tokio::test]
async fn test_switch_to_missing_keeps_pointer() {
    let (dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    let err = store.switch("ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref n) if n == "ghost"));

    assert_eq!(store.get_active().await.unwrap().name, "acme");
    let pointer = std::fs::read_to_string(dir.path().join("active")).unwrap();
    assert_eq!(pointer.trim(), "acme");
}

#[tokio::test]
async fn test_switch_to_active_reports_already_active() {
    let (_dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    let outcome = store.switch("acme").await.unwrap();
    assert!(outcome.already_active);
    assert!(outcome.workspace.active);
}

#[tokio::test]
async fn test_remove_active_does_not_activate_another() {
    let (dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();
    store
        .add(cloud("beta", "beta.atlassian.net", "beta-token-0002"))
        .await
        .unwrap();

    store.remove("acme").await.unwrap();

    assert!(matches!(
        store.get_active().await,
        Err(StoreError::NoActiveWorkspace)
    ));
    assert!(!dir.path().join("active").exists());
    assert!(!dir.path().join("accounts").join("acme.json").exists());
    assert!(store.list().await.iter().all(|w| !w.active));
}

#[tokio::test]
async fn test_remove_unknown_is_not_found() {
    let (_dir, store) = open().await;
    assert!(matches!(
        store.remove("ghost").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_never_contains_raw_token() {
    let (_dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "super-secret-token-9876"))
        .await
        .unwrap();
    store
        .add(cloud("beta", "beta.atlassian.net", "short-tok1"))
        .await
        .unwrap();

    let list = store.list().await;
    let rendered = serde_json::to_string(&list).unwrap();
    assert!(!rendered.contains("super-secret-token-9876"));
    assert!(!rendered.contains("short-tok1"));

    assert_eq!(list[0].api_token, "****9876");
    assert_eq!(list[1].api_token, "****");
}

#[tokio::test]
async fn test_list_is_in_insertion_order() {
    let (_dir, store) = open().await;
    for name in ["zeta", "alpha", "mid"] {
        store
            .add(cloud(name, "x.atlassian.net", "token-1234567890"))
            .await
            .unwrap();
        // Distinct creation timestamps.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let names: Vec<String> = store.list().await.into_iter().map(|w| w.name).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn test_invalid_fields_rejected() {
    let (_dir, store) = open().await;

    let err = store
        .add(cloud("-bad", "acme.atlassian.net", "token-1234567890"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidProfile { field: "name", .. }));

    let mut no_email = cloud("acme", "acme.atlassian.net", "token-1234567890");
    no_email.email = Some("not-an-email".to_string());
    let err = store.add(no_email).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidProfile { field: "email", .. }));

    assert!(store.list().await.is_empty());
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = WorkspaceStore::open(dir.path()).await.unwrap();
        store
            .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
            .await
            .unwrap();
        store
            .add(cloud("beta", "beta.atlassian.net", "beta-token-0002"))
            .await
            .unwrap();
        store.switch("beta").await.unwrap();
    }

    let store = WorkspaceStore::open(dir.path()).await.unwrap();
    assert_eq!(store.get_active().await.unwrap().name, "beta");
    assert_eq!(store.list().await.len(), 2);
}

#[tokio::test]
async fn test_dangling_pointer_self_heals_on_open() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("accounts")).unwrap();
    std::fs::write(dir.path().join("active"), "ghost").unwrap();

    let store = WorkspaceStore::open(dir.path()).await.unwrap();

    assert!(matches!(
        store.get_active().await,
        Err(StoreError::NoActiveWorkspace)
    ));
    assert!(!dir.path().join("active").exists());
}

#[tokio::test]
async fn test_skeleton_is_not_activated_or_usable() {
    let (_dir, store) = open().await;

    let path = store
        .create_skeleton("draft", AuthType::Cloud)
        .await
        .unwrap();
    assert!(path.ends_with("accounts/draft.json"));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("_instructions"));

    assert!(matches!(
        store.get_active().await,
        Err(StoreError::NoActiveWorkspace)
    ));
    let listed = store.list().await;
    assert!(!listed[0].complete);

    assert!(matches!(
        store.credentials(Some("draft")).await,
        Err(StoreError::IncompleteCredentials(ref n)) if n == "draft"
    ));

    assert!(matches!(
        store.create_skeleton("draft", AuthType::Pat).await,
        Err(StoreError::DuplicateName(_))
    ));
}

#[tokio::test]
async fn test_first_add_after_skeleton_is_activated() {
    let (_dir, store) = open().await;
    store
        .create_skeleton("draft", AuthType::Cloud)
        .await
        .unwrap();

    let added = store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    assert!(added.activated);
    assert_eq!(store.get_active().await.unwrap().name, "acme");
}

#[tokio::test]
async fn test_edited_skeleton_becomes_usable_without_restart() {
    let (_dir, store) = open().await;
    let path = store
        .create_skeleton("draft", AuthType::Cloud)
        .await
        .unwrap();

    let mut file: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    file["site_url"] = "https://draft.atlassian.net".into();
    file["email"] = "me@draft.io".into();
    file["api_token"] = "real-token-12345".into();
    std::fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let creds = store.credentials(Some("draft")).await.unwrap();
    assert_eq!(creds.site_url, "https://draft.atlassian.net");
    assert!(store.list().await[0].complete);
}

#[tokio::test]
async fn test_listing_sees_skeleton_edits() {
    let (_dir, store) = open().await;
    let path = store
        .create_skeleton("draft", AuthType::Pat)
        .await
        .unwrap();
    store.switch("draft").await.unwrap();
    assert!(!store.get_active().await.unwrap().complete);

    let mut file: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    file["site_url"] = "https://jira.draft.internal".into();
    file["api_token"] = "pat-token-67890".into();
    std::fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let listed = store.list().await;
    assert!(listed[0].complete);
    assert_eq!(listed[0].site_url, "https://jira.draft.internal");

    let active = store.get_active().await.unwrap();
    assert!(active.complete);
    assert_eq!(active.api_token, "****7890");
}

#[tokio::test]
async fn test_reload_picks_up_external_changes() {
    let (dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    std::fs::remove_file(dir.path().join("accounts").join("acme.json")).unwrap();
    store.reload().await.unwrap();

    assert!(store.list().await.is_empty());
    assert!(matches!(
        store.get_active().await,
        Err(StoreError::NoActiveWorkspace)
    ));
}

#[tokio::test]
async fn test_mark_validated_persists() {
    let (dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    let at = chrono::Utc::now();
    store.mark_validated("acme", at).await.unwrap();

    let reopened = WorkspaceStore::open(dir.path()).await.unwrap();
    let profile = reopened.profile(Some("acme")).await.unwrap();
    assert_eq!(
        profile.last_validated.map(|t| t.timestamp()),
        Some(at.timestamp())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_profile_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, store) = open().await;
    store
        .add(cloud("acme", "acme.atlassian.net", "acme-token-0001"))
        .await
        .unwrap();

    let path = dir.path().join("accounts").join("acme.json");
    let mode = std::fs::metadata(path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
