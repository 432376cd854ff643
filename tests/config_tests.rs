use recovery_pilot::config::PilotConfig;
use recovery_pilot::RecoveryError;

#[test]
fn test_default_config() {
    let config = PilotConfig::default();

    assert_eq!(config.orchestrator.max_concurrent_recoveries, 3);
    assert_eq!(config.orchestrator.global_cooldown_ms, 1000);
    assert!(config.orchestrator.enable_auto_recovery);
    assert_eq!(config.orchestrator.escalation_threshold, 3);
    assert!(config.orchestrator.tracking_enabled);

    assert_eq!(config.ledger.max_entries, 100);

    assert_eq!(config.builtin.network_probe_timeout_ms, 10_000);
    assert_eq!(config.builtin.network_max_attempts, 3);
    assert_eq!(config.builtin.network_retry_delay_ms, 2000);
    assert_eq!(config.builtin.probe_address, "1.1.1.1:53");
    assert_eq!(config.builtin.rate_limit_default_wait_ms, 60_000);
    assert_eq!(config.builtin.server_backoff_ms, 2000);

    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_load_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = PilotConfig::load(&dir.path().join("absent.toml"))
        .await
        .unwrap();

    assert_eq!(config.orchestrator.max_concurrent_recoveries, 3);
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("recovery-pilot.toml");

    let mut config = PilotConfig::default();
    config.orchestrator.max_concurrent_recoveries = 8;
    config.orchestrator.global_cooldown_ms = 250;
    config.builtin.probe_address = "10.0.0.1:443".into();
    config.save(&path).await.unwrap();

    let loaded = PilotConfig::load(&path).await.unwrap();
    assert_eq!(loaded.orchestrator.max_concurrent_recoveries, 8);
    assert_eq!(loaded.orchestrator.global_cooldown_ms, 250);
    assert_eq!(loaded.builtin.probe_address, "10.0.0.1:443");
    assert_eq!(loaded.ledger.max_entries, 100);
}

#[tokio::test]
async fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    tokio::fs::write(&path, "[builtin]\nserver_backoff_ms = 50\n")
        .await
        .unwrap();

    let config = PilotConfig::load(&path).await.unwrap();
    assert_eq!(config.builtin.server_backoff_ms, 50);
    assert_eq!(config.builtin.timeout_delay_ms, 1000);
    assert_eq!(config.orchestrator.escalation_threshold, 3);
}

#[tokio::test]
async fn test_invalid_values_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    tokio::fs::write(
        &path,
        "[orchestrator]\nmax_concurrent_recoveries = 0\n\n[ledger]\nmax_entries = 0\n",
    )
    .await
    .unwrap();

    let err = PilotConfig::load(&path).await.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, RecoveryError::Config(_)));
    assert!(message.contains("max_concurrent_recoveries"));
    assert!(message.contains("ledger.max_entries"));
}

#[tokio::test]
async fn test_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    tokio::fs::write(&path, "[orchestrator\nmax = ").await.unwrap();

    let err = PilotConfig::load(&path).await.unwrap_err();
    assert!(matches!(err, RecoveryError::Toml(_)));
}

#[tokio::test]
async fn test_save_refuses_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.toml");
    let mut config = PilotConfig::default();
    config.builtin.probe_interval_ms = 0;

    assert!(config.save(&path).await.is_err());
    assert!(!path.exists());
}

#[test]
fn test_to_toml_contains_sections() {
    let rendered = PilotConfig::default().to_toml().unwrap();
    assert!(rendered.contains("[orchestrator]"));
    assert!(rendered.contains("[ledger]"));
    assert!(rendered.contains("[builtin]"));
    assert!(rendered.contains("global_cooldown_ms = 1000"));
}
