//! Configuration precedence tests.
//!
//! Tests the daemon's layering: file < environment < command line.

use std::env;
use std::io::Write;

use clap::Parser;
use ctmon_core::config::CtmonConfig;
use ctmon_daemon::cli::DaemonCli;
use serial_test::serial;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[tokio::test]
#[serial]
async fn test_cli_output_overrides_file_and_env() {
    // Given: A config file and an env override for the output path
    let file = write_config(
        r#"
[report]
output = "/var/log/from-file.log"
"#,
    );
    // SAFETY: Test isolation - we set and clean up env vars
    unsafe {
        env::set_var("CTMON_REPORT_OUTPUT", "/var/log/from-env.log");
    }

    // When: Loading through the daemon with and without the CLI flag
    let path = file.path().to_str().expect("utf8 path");
    let without_flag = DaemonCli::try_parse_from(["ctmon", "-c", path])
        .expect("valid args")
        .load_config()
        .await;
    let with_flag = DaemonCli::try_parse_from(["ctmon", "-c", path, "-o", "-"])
        .expect("valid args")
        .load_config()
        .await;

    // SAFETY: Test cleanup
    unsafe {
        env::remove_var("CTMON_REPORT_OUTPUT");
    }

    // Then: Env beats file, CLI beats env
    let (config, _) = without_flag.expect("should load");
    assert_eq!(config.report.output, "/var/log/from-env.log");
    let (config, _) = with_flag.expect("should load");
    assert_eq!(config.report.output, "-");
}

#[tokio::test]
#[serial]
async fn test_cli_flag_fixes_invalid_file_value() {
    // Given: A config file with an unsupported log format
    let file = write_config(
        r#"
[general]
log_format = "xml"
"#,
    );
    let path = file.path().to_str().expect("utf8 path");

    // When: Loading with and without a CLI override
    let plain = DaemonCli::try_parse_from(["ctmon", "-c", path])
        .expect("valid args")
        .load_config()
        .await;
    let overridden = DaemonCli::try_parse_from(["ctmon", "-c", path, "--log-format", "pretty"])
        .expect("valid args")
        .load_config()
        .await;

    // Then: Validation only sees the final merged values
    assert!(plain.is_err(), "xml log format should be rejected");
    let (config, _) = overridden.expect("CLI flag should win before validation");
    assert_eq!(config.general.log_format, "pretty");
}

#[tokio::test]
#[serial]
async fn test_unparsable_env_values_are_returned_for_logging() {
    // Given: An env override that is not a number
    // SAFETY: Test isolation - we set and clean up env vars
    unsafe {
        env::set_var("CTMON_FILTER_MIN_BYTES", "lots");
    }

    // When: Loading without a config file
    let result = DaemonCli::try_parse_from(["ctmon"])
        .expect("valid args")
        .load_config()
        .await;

    // SAFETY: Test cleanup
    unsafe {
        env::remove_var("CTMON_FILTER_MIN_BYTES");
    }

    // Then: The default stays in place and the bad value is handed back
    let (config, rejected) = result.expect("defaults are valid");
    assert_eq!(config.filter.min_bytes, 1024);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].env_key, "CTMON_FILTER_MIN_BYTES");
    assert_eq!(rejected[0].value, "lots");
}

#[test]
#[serial]
fn test_defaults_without_config_file() {
    // Given: No config file and no environment overrides

    // When: Loading from the environment only
    let config = CtmonConfig::from_env().expect("defaults are valid");

    // Then: Built-in defaults apply
    assert_eq!(config.source.command, "conntrack");
    assert_eq!(config.filter.allowed_ports, vec![80, 443]);
    assert_eq!(config.report.output, "conntrack.log");
    assert!(!config.metrics.enabled);
}

#[test]
fn test_cli_log_level_override_is_validated() {
    // Given: A CLI flag with an unknown log level
    let cli = DaemonCli::try_parse_from(["ctmon", "--log-level", "verbose"]).expect("valid args");
    let mut config = CtmonConfig::default();

    // When: Applying and validating
    cli.apply_overrides(&mut config);
    let result = config.validate();

    // Then: Validation rejects it
    assert!(result.is_err(), "unknown log level should be rejected");
}

#[test]
fn test_validate_flag_and_config_path() {
    // Given / When: Parsing --validate with a config path
    let cli = DaemonCli::try_parse_from(["ctmon", "--validate", "-c", "/etc/ctmon/ctmon.toml"])
        .expect("valid args");

    // Then: Both are captured
    assert!(cli.validate);
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/ctmon/ctmon.toml"))
    );
}

#[tokio::test]
#[serial]
async fn test_missing_config_file_fails() {
    // Given: A path that does not exist
    let dir = tempfile::tempdir().expect("temp dir");

    // When: Loading config
    let result = CtmonConfig::load(dir.path().join("missing.toml")).await;

    // Then: Should fail
    assert!(result.is_err(), "missing config file should fail");
}
