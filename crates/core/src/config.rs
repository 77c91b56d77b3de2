//! 설정 관리 -- ctmon.toml 파싱 및 런타임 설정
//!
//! [`CtmonConfig`]는 conntrack 이벤트 소스, 수용 필터, 리포트 출력,
//! 메트릭 노출 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CTMON_REPORT_OUTPUT=/var/log/ctmon.log` 형식)
//! 3. 설정 파일 (`ctmon.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ctmon_core::error::CtmonError> {
//! use ctmon_core::config::CtmonConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CtmonConfig::load("ctmon.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CtmonConfig::parse("[filter]\nmin_bytes = 4096")?;
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, CtmonError};

/// ctmon 통합 설정
///
/// `ctmon.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtmonConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// conntrack 이벤트 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 수용 필터 설정
    #[serde(default)]
    pub filter: FilterConfig,
    /// 리포트 출력 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl CtmonConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    ///
    /// 무시된 환경변수는 `warn!`으로 기록하므로, 구독자 설치 이후에 호출해야 보입니다.
    /// 로깅 초기화 전에 설정이 필요하면 [`from_file`](Self::from_file)과
    /// [`apply_env_overrides`](Self::apply_env_overrides)를 직접 조합합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CtmonError> {
        let mut config = Self::from_file(path).await?;
        for rejected in config.apply_env_overrides() {
            rejected.warn();
        }
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용하고 검증합니다 (설정 파일 없이 실행할 때).
    pub fn from_env() -> Result<Self, CtmonError> {
        let mut config = Self::default();
        for rejected in config.apply_env_overrides() {
            rejected.warn();
        }
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 읽습니다.
    ///
    /// 환경변수 오버라이드와 검증은 하지 않습니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CtmonError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CtmonError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CtmonError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CtmonError> {
        toml::from_str(toml_str).map_err(|e| {
            CtmonError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CTMON_{SECTION}_{FIELD}`
    /// 예: `CTMON_FILTER_ALLOWED_PORTS=80,443,8443`
    ///
    /// 파싱할 수 없는 값은 적용하지 않고 반환 목록에 담습니다.
    /// 기록 여부는 호출자가 정합니다.
    pub fn apply_env_overrides(&mut self) -> Vec<RejectedOverride> {
        let mut rejected = Vec::new();

        // General
        override_string(&mut self.general.log_level, "CTMON_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CTMON_GENERAL_LOG_FORMAT");

        // Source
        override_string(&mut self.source.command, "CTMON_SOURCE_COMMAND");
        override_args(&mut self.source.args, "CTMON_SOURCE_ARGS");
        override_string(
            &mut self.source.acct_sysctl_path,
            "CTMON_SOURCE_ACCT_SYSCTL_PATH",
        );
        override_parsed(
            &mut self.source.max_line_length,
            "CTMON_SOURCE_MAX_LINE_LENGTH",
            &mut rejected,
        );

        // Filter
        override_parsed(
            &mut self.filter.min_packets,
            "CTMON_FILTER_MIN_PACKETS",
            &mut rejected,
        );
        override_parsed(
            &mut self.filter.min_bytes,
            "CTMON_FILTER_MIN_BYTES",
            &mut rejected,
        );
        override_ports(
            &mut self.filter.allowed_ports,
            "CTMON_FILTER_ALLOWED_PORTS",
            &mut rejected,
        );

        // Report
        override_string(&mut self.report.output, "CTMON_REPORT_OUTPUT");

        // Metrics
        override_parsed(
            &mut self.metrics.enabled,
            "CTMON_METRICS_ENABLED",
            &mut rejected,
        );
        override_string(&mut self.metrics.listen_addr, "CTMON_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "CTMON_METRICS_PORT", &mut rejected);

        rejected
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CtmonError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.source.command.trim().is_empty() {
            return Err(invalid("source.command", "must not be empty"));
        }

        if self.source.max_line_length == 0 {
            return Err(invalid("source.max_line_length", "must be greater than 0"));
        }

        if self.filter.allowed_ports.is_empty() {
            return Err(invalid(
                "filter.allowed_ports",
                "at least one destination port is required",
            ));
        }

        if self.report.output.trim().is_empty() {
            return Err(invalid("report.output", "must not be empty"));
        }

        // 메트릭이 비활성화 상태면 주소 검증을 건너뜀
        if self.metrics.enabled && self.metrics.listen_addr.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "metrics.listen_addr",
                format!("'{}' is not an IP address", self.metrics.listen_addr),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> CtmonError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// conntrack 이벤트 소스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 이벤트를 출력하는 외부 명령
    pub command: String,
    /// 명령 인자
    pub args: Vec<String>,
    /// conntrack 바이트/패킷 계수 활성화 여부를 확인할 sysctl 경로
    pub acct_sysctl_path: String,
    /// 이벤트 라인 최대 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            command: "conntrack".to_owned(),
            args: ["-E", "-e", "DESTROY", "-p", "tcp"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            acct_sysctl_path: "/proc/sys/net/netfilter/nf_conntrack_acct".to_owned(),
            max_line_length: 4096,
        }
    }
}

/// 수용 필터 설정
///
/// 기본값은 웹 포트(80, 443)에서 의미 있는 양을 전송한 흐름만 집계합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 양방향 합산 최소 패킷 수
    pub min_packets: u64,
    /// 양방향 합산 최소 바이트 수
    pub min_bytes: u64,
    /// 허용된 original 방향 목적지 포트
    pub allowed_ports: Vec<u16>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_packets: 10,
            min_bytes: 1024,
            allowed_ports: vec![80, 443],
        }
    }
}

/// 리포트 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 리포트 파일 경로 (`-`는 표준 출력)
    pub output: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: "conntrack.log".to_owned(),
        }
    }
}

/// Prometheus 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
        }
    }
}

/// 파싱할 수 없어 무시된 환경변수 오버라이드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    /// 환경변수 이름
    pub env_key: &'static str,
    /// 원래 값
    pub value: String,
}

impl RejectedOverride {
    /// `warn!` 레벨로 기록합니다.
    pub fn warn(&self) {
        warn!(
            env_key = self.env_key,
            value = self.value.as_str(),
            "failed to parse value from env var, ignoring"
        );
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: std::str::FromStr>(
    target: &mut T,
    env_key: &'static str,
    rejected: &mut Vec<RejectedOverride>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => rejected.push(RejectedOverride { env_key, value: val }),
        }
    }
}

fn override_args(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split_whitespace().map(str::to_owned).collect();
    }
}

fn override_ports(
    target: &mut Vec<u16>,
    env_key: &'static str,
    rejected: &mut Vec<RejectedOverride>,
) {
    if let Ok(val) = std::env::var(env_key) {
        let parsed: Result<Vec<u16>, _> = val.split(',').map(|s| s.trim().parse::<u16>()).collect();
        match parsed {
            Ok(ports) => *target = ports,
            Err(_) => rejected.push(RejectedOverride { env_key, value: val }),
        }
    }
}
