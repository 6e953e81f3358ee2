use std::time::Duration;

use hearth::config::HostConfig;

#[tokio::test]
async fn test_missing_config_uses_defaults() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = HostConfig::load(&dir.path().join(HostConfig::FILE_NAME))
        .await
        .unwrap();
    assert_eq!(config, HostConfig::default());
    assert_eq!(config.poll_interval(), Duration::from_millis(200));
}

#[tokio::test]
async fn test_config_save_and_load() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("profile").join(HostConfig::FILE_NAME);
    let config = HostConfig {
        poll_interval_ms: 50,
        profile_name: "Alice".to_string(),
        max_ticks: Some(10),
    };

    config.save(&path).await.unwrap();
    let loaded = HostConfig::load(&path).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join(HostConfig::FILE_NAME);
    tokio::fs::write(&path, r#"{"profile_name": "Bob"}"#)
        .await
        .unwrap();

    let config = HostConfig::load(&path).await.unwrap();

    assert_eq!(config.profile_name, "Bob");
    assert_eq!(config.poll_interval_ms, 200);
    assert_eq!(config.max_ticks, None);
}

#[tokio::test]
async fn test_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join(HostConfig::FILE_NAME);
    tokio::fs::write(&path, "not json").await.unwrap();

    let err = HostConfig::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_zero_poll_interval_is_clamped() {
    let config = HostConfig {
        poll_interval_ms: 0,
        ..HostConfig::default()
    };
    assert_eq!(config.poll_interval(), Duration::from_millis(1));
}
