//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ExporterConfig;
use crate::domain::errors::ExporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExporterConfig
/// 4. Applies environment variable overrides (CWL_EXPORT_* prefix)
/// 5. Validates the configuration
///
/// Fields a run requires but the invocation payload may still supply
/// (destination bucket, notification topic) are not checked here; see
/// [`ExporterConfig::require_run_fields`].
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use cwl_export::config::loader::load_config;
///
/// let config = load_config("cwl-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
pub fn parse_config(contents: &str) -> Result<ExporterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)
        .map_err(|e| ExporterError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ExporterError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the CWL_EXPORT_* prefix
///
/// Environment variables follow the pattern: CWL_EXPORT_<SECTION>_<KEY>,
/// for example CWL_EXPORT_EXPORT_DESTINATION_BUCKET or CWL_EXPORT_AWS_REGION.
/// Values that fail to parse are ignored.
fn apply_env_overrides(config: &mut ExporterConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // AWS overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_AWS_REGION") {
        config.aws.region = Some(val);
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_AWS_PROFILE") {
        config.aws.profile = Some(val);
    }

    // Export overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_DESTINATION_BUCKET") {
        config.export.destination_bucket = Some(val);
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_DESTINATION_PREFIX") {
        config.export.destination_prefix = val;
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_NOTIFICATION_TOPIC_ARN") {
        config.export.notification_topic_arn = Some(val);
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_TAG_KEY") {
        config.export.tag_key = val;
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_TAG_VALUE") {
        config.export.tag_value = val;
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_CHUNK_SIZE_DAYS") {
        if let Ok(days) = val.parse() {
            config.export.chunk_size_days = days;
        }
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_POOL_WIDTH") {
        if let Ok(width) = val.parse() {
            config.export.pool_width = width;
        }
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_EXPORT_PARAMETER_PREFIX") {
        config.export.parameter_prefix = val;
    }

    // Chunking overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_CHUNKING_ADAPTIVE") {
        config.chunking.adaptive = val.parse().unwrap_or(true);
    }

    // Polling overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_POLLING_INTERVAL_SECS") {
        if let Ok(secs) = val.parse() {
            config.polling.interval_secs = secs;
        }
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_POLLING_MAX_WAIT_HOURS") {
        if let Ok(hours) = val.parse() {
            config.polling.max_wait_hours = hours;
        }
    }

    // Retry overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.retry.max_attempts = attempts;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CWL_EXPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("CWL_EXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CWL_LOADER_TEST_BUCKET", "archive-bucket");
        let input = "destination_bucket = \"${CWL_LOADER_TEST_BUCKET}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "destination_bucket = \"archive-bucket\"\n");
        std::env::remove_var("CWL_LOADER_TEST_BUCKET");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CWL_LOADER_MISSING_VAR");
        let input = "destination_bucket = \"${CWL_LOADER_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("CWL_LOADER_COMMENTED_VAR");
        let input = "# bucket = \"${CWL_LOADER_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${CWL_LOADER_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[export]
destination_bucket = "log-archive"
notification_topic_arn = "arn:aws:sns:us-east-1:123456789012:log-exports"
pool_width = 2

[polling]
interval_secs = 30
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(
            config.export.destination_bucket.as_deref(),
            Some("log-archive")
        );
        assert_eq!(config.export.pool_width, 2);
        assert_eq!(config.polling.interval_secs, 30);
        // Untouched sections keep their defaults
        assert_eq!(config.export.tag_key, "ExportToS3");
        assert_eq!(config.retry.max_attempts, 10);
    }

    #[test]
    fn test_parse_config_rejects_invalid_values() {
        let result = parse_config("[export]\npool_width = 0\n");
        assert!(matches!(result, Err(ExporterError::Configuration(_))));
    }

    #[test]
    fn test_parse_config_empty_is_valid() {
        let config = parse_config("").unwrap();
        assert!(config.export.destination_bucket.is_none());
    }
}
