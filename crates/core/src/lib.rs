//! ctmon 공통 크레이트
//!
//! conntrack 이벤트 기반 트래픽 집계기(`ctmon`)의 모든 크레이트가 공유하는
//! 에러 타입, `ctmon.toml` 설정, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `ctmon.toml` 파싱, 환경변수 오버라이드, 유효성 검증
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: Prometheus 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, CtmonError};

// 설정
pub use config::{
    CtmonConfig, FilterConfig, GeneralConfig, MetricsConfig, RejectedOverride, ReportConfig,
    SourceConfig,
};
