//! ctmon.toml 통합 설정 테스트
//!
//! - ctmon.toml.example 파싱 테스트
//! - 파일 로딩 + 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use ctmon_core::config::CtmonConfig;
use ctmon_core::error::{ConfigError, CtmonError};
use serial_test::serial;

// =============================================================================
// ctmon.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../ctmon.toml.example");
    let config = CtmonConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.source.command, "conntrack");
    assert_eq!(config.filter.allowed_ports, vec![80, 443]);
    assert_eq!(config.report.output, "conntrack.log");
    assert_eq!(config.metrics.port, 9187);
}

#[test]
fn example_config_matches_defaults() {
    let content = include_str!("../../../ctmon.toml.example");
    let parsed = CtmonConfig::parse(content).expect("should parse");
    let defaults = CtmonConfig::default();

    assert_eq!(parsed.source.args, defaults.source.args);
    assert_eq!(parsed.filter.min_packets, defaults.filter.min_packets);
    assert_eq!(parsed.filter.min_bytes, defaults.filter.min_bytes);
    assert_eq!(
        parsed.source.acct_sysctl_path,
        defaults.source.acct_sysctl_path
    );
}

// =============================================================================
// 파일 로딩
// =============================================================================

#[tokio::test]
#[serial]
async fn load_applies_env_over_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[report]\noutput = \"/tmp/from-file.log\"").expect("write");

    // SAFETY: serial_test로 환경변수를 만지는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("CTMON_REPORT_OUTPUT", "/tmp/from-env.log") };
    let config = CtmonConfig::load(file.path()).await;
    unsafe { std::env::remove_var("CTMON_REPORT_OUTPUT") };

    let config = config.expect("config should load");
    assert_eq!(config.report.output, "/tmp/from-env.log");
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_values_from_env() {
    let file = tempfile::NamedTempFile::new().expect("tempfile");

    // SAFETY: serial_test로 환경변수를 만지는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("CTMON_GENERAL_LOG_FORMAT", "xml") };
    let result = CtmonConfig::load(file.path()).await;
    unsafe { std::env::remove_var("CTMON_GENERAL_LOG_FORMAT") };

    let err = result.expect_err("xml log format must be rejected");
    assert!(matches!(
        err,
        CtmonError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn empty_file_uses_defaults() {
    let file = tempfile::NamedTempFile::new().expect("tempfile");
    let config = CtmonConfig::from_file(file.path())
        .await
        .expect("empty file is a valid config");
    assert_eq!(config.filter.min_bytes, 1024);
}

#[tokio::test]
async fn malformed_file_returns_parse_error() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[filter\nmin_bytes = ").expect("write");

    let err = CtmonConfig::from_file(file.path())
        .await
        .expect_err("malformed toml must fail");
    assert!(matches!(
        err,
        CtmonError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_returns_parse_error() {
    let err = CtmonConfig::parse("[filter]\nallowed_ports = \"80\"").unwrap_err();
    assert!(matches!(
        err,
        CtmonError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn from_file_defers_validation() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[general]\nlog_format = \"xml\"").expect("write");

    // 읽기만 하고 검증은 호출자에게 맡김
    let mut config = CtmonConfig::from_file(file.path())
        .await
        .expect("from_file does not validate");
    assert!(config.validate().is_err());

    config.general.log_format = "pretty".to_owned();
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn apply_env_overrides_returns_rejected_values() {
    let mut config = CtmonConfig::default();

    // SAFETY: serial_test로 환경변수를 만지는 테스트를 직렬화합니다.
    unsafe {
        std::env::set_var("CTMON_FILTER_MIN_BYTES", "lots");
        std::env::set_var("CTMON_FILTER_MIN_PACKETS", "25");
    }
    let rejected = config.apply_env_overrides();
    unsafe {
        std::env::remove_var("CTMON_FILTER_MIN_BYTES");
        std::env::remove_var("CTMON_FILTER_MIN_PACKETS");
    }

    assert_eq!(config.filter.min_packets, 25);
    assert_eq!(config.filter.min_bytes, 1024);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].env_key, "CTMON_FILTER_MIN_BYTES");
    assert_eq!(rejected[0].value, "lots");
}
