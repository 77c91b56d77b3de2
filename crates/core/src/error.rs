//! 에러 타입 -- 도메인별 에러 정의

/// ctmon 최상위 에러 타입
///
/// 각 도메인 크레이트의 에러는 `From` 구현을 통해 이 타입으로 변환되어
/// 상위 레이어에서 `?` 연산자로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum CtmonError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 트래픽 집계 처리 에러
    #[error("accounting error: {0}")]
    Accounting(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
