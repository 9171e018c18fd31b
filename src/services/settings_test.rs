use super::*;
use crate::error::ErrorCode;

#[tokio::test]
async fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
    assert_eq!(store.user_name().await, None);
    assert_eq!(store.api_key().await, None);
}

#[tokio::test]
async fn set_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store = SettingsStore::open(&path).unwrap();
    store.set(USER_NAME_KEY, Some("Ana")).await.unwrap();
    store.set(API_KEY_KEY, Some("key-123")).await.unwrap();

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.user_name().await.as_deref(), Some("Ana"));
    assert_eq!(reopened.api_key().await.as_deref(), Some("key-123"));
}

#[tokio::test]
async fn blank_value_removes_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    store.set(API_KEY_KEY, Some("key-123")).await.unwrap();
    store.set(API_KEY_KEY, Some("   ")).await.unwrap();
    assert_eq!(store.api_key().await, None);

    let raw = std::fs::read_to_string(&path).unwrap();
    let on_disk: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
    assert!(!on_disk.contains_key(API_KEY_KEY));
}

#[tokio::test]
async fn values_are_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
    store.set(USER_NAME_KEY, Some("  Ana  ")).await.unwrap();
    assert_eq!(store.user_name().await.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let store = SettingsStore::open(&path).unwrap();
    store.set(USER_NAME_KEY, Some("Ana")).await.unwrap();
    assert!(path.exists());
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "not json").unwrap();

    let Err(err) = SettingsStore::open(&path) else {
        panic!("expected parse error");
    };
    assert!(matches!(err, SettingsError::Parse(_)));
    assert_eq!(err.error_code(), "E_SETTINGS_PARSE");
    assert!(!err.retryable());
}

#[test]
fn empty_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "").unwrap();
    assert!(SettingsStore::open(&path).is_ok());
}

#[tokio::test]
async fn set_many_commits_all_keys_together() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();

    store
        .set_many(&[(USER_NAME_KEY, Some("Ana")), (API_KEY_KEY, Some("key-123"))])
        .await
        .unwrap();

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.user_name().await.as_deref(), Some("Ana"));
    assert_eq!(reopened.api_key().await.as_deref(), Some("key-123"));
}

#[tokio::test]
async fn failed_set_many_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = SettingsStore::open(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = store
        .set_many(&[(USER_NAME_KEY, Some("Ana")), (API_KEY_KEY, Some("key-123"))])
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::Io(_)));
    assert_eq!(store.user_name().await, None);
    assert_eq!(store.api_key().await, None);
}
