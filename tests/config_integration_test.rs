//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold ENV_MUTEX to avoid
//! interference between tests.

use cwl_export::config::{load_config, ExporterConfig, InvocationPayload};
use cwl_export::domain::ExporterError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("CWL_EXPORT_APPLICATION_LOG_LEVEL");
    std::env::remove_var("CWL_EXPORT_EXPORT_POOL_WIDTH");
    std::env::remove_var("CWL_EXPORT_EXPORT_DESTINATION_BUCKET");
    std::env::remove_var("CWL_EXPORT_POLLING_INTERVAL_SECS");
    std::env::remove_var("TEST_ARCHIVE_BUCKET");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[aws]
region = "eu-west-1"

[export]
destination_bucket = "log-archive"
destination_prefix = "cloudwatch"
notification_topic_arn = "arn:aws:sns:eu-west-1:123456789012:log-exports"
tag_key = "Archive"
tag_value = "yes"
chunk_size_days = 3
pool_width = 4
parameter_prefix = "/exports"

[chunking]
adaptive = false

[polling]
interval_secs = 30
max_wait_hours = 6
heartbeat_secs = 120

[retry]
max_attempts = 5
max_delay_secs = 16

[logging]
local_enabled = false
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.export.destination_prefix, "cloudwatch");
    assert_eq!(config.export.tag_key, "Archive");
    assert_eq!(config.export.chunk_size_days, 3);
    assert_eq!(config.export.pool_width, 4);
    assert_eq!(config.export.parameter_prefix, "/exports");
    assert!(!config.chunking.adaptive);
    assert_eq!(config.polling.max_wait_hours, 6);
    assert_eq!(config.retry.max_attempts, 5);
    assert!(!config.logging.local_enabled);
    assert!(config.require_run_fields().is_ok());
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_ARCHIVE_BUCKET", "substituted-bucket");

    let file = write_config("[export]\ndestination_bucket = \"${TEST_ARCHIVE_BUCKET}\"\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config.export.destination_bucket.as_deref(),
        Some("substituted-bucket")
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[export]\ndestination_bucket = \"${TEST_ARCHIVE_BUCKET}\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_ARCHIVE_BUCKET"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("CWL_EXPORT_EXPORT_POOL_WIDTH", "6");
    std::env::set_var("CWL_EXPORT_EXPORT_DESTINATION_BUCKET", "env-bucket");
    std::env::set_var("CWL_EXPORT_POLLING_INTERVAL_SECS", "not-a-number");

    let file = write_config("[export]\npool_width = 2\n");
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.export.pool_width, 6);
    assert_eq!(config.export.destination_bucket.as_deref(), Some("env-bucket"));
    // Unparseable overrides are ignored
    assert_eq!(config.polling.interval_secs, 60);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_fails_validation() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("CWL_EXPORT_APPLICATION_LOG_LEVEL", "loud");

    let file = write_config("");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ExporterError::Configuration(_)));

    cleanup_env_vars();
}

#[test]
fn test_invocation_payload_file_overrides_config() {
    let mut base = ExporterConfig::default();
    base.export.destination_bucket = Some("from-file".to_string());

    let event = write_config(
        r#"{
            "destination": "from-event",
            "notification_target": "arn:aws:sns:us-east-1:123456789012:exports",
            "tag_key": "Archive"
        }"#,
    );
    let payload = InvocationPayload::from_file(event.path()).unwrap();
    let config = payload.resolve(base).unwrap();

    assert_eq!(config.export.destination_bucket.as_deref(), Some("from-event"));
    assert_eq!(config.export.tag_key, "Archive");
    assert_eq!(config.export.tag_value, "true");
}

#[test]
fn test_payload_without_topic_is_rejected() {
    let payload = InvocationPayload::from_json(r#"{"destination_bucket": "b"}"#).unwrap();
    match payload.resolve(ExporterConfig::default()) {
        Err(ExporterError::MissingField(fields)) => {
            assert_eq!(fields, vec!["notification_topic_arn".to_string()]);
        }
        other => panic!("Expected MissingField, got {other:?}"),
    }
}
