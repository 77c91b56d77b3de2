//! 집계 엔진 에러 타입
//!
//! [`AccountingError`]는 이벤트 파싱, 입력 스트림, 리포트 출력에서 발생하는
//! 에러를 표현합니다. `From<AccountingError> for CtmonError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.
//!
//! # 전파 정책
//! - [`AccountingError::MalformedEvent`]: 라인 단위 에러. 로그만 남기고 다음 라인으로 진행
//! - [`AccountingError::StreamTerminated`], [`AccountingError::Io`]: 수집 루프 종료, 호출자에게 전파
//! - [`AccountingError::SinkWrite`]: 로그를 남기고 윈도우를 복원한 뒤 수집 계속

use ctmon_core::error::CtmonError;

/// 집계 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AccountingError {
    /// 이벤트 라인 파싱 실패
    #[error("malformed event at token {position}: {reason}")]
    MalformedEvent {
        /// 문제가 된 토큰 위치 (1부터 시작, 라인 전체 문제면 0)
        position: usize,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트 스트림이 닫힘
    #[error("event stream terminated")]
    StreamTerminated,

    /// 리포트 출력 실패
    #[error("report sink write failed: {0}")]
    SinkWrite(#[source] std::io::Error),

    /// 입력 스트림 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccountingError {
    pub(crate) fn malformed(position: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            position,
            reason: reason.into(),
        }
    }

    /// 수집 루프를 계속 진행할 수 있는 라인 단위 에러인지 반환합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedEvent { .. } | Self::SinkWrite(_))
    }
}

impl From<AccountingError> for CtmonError {
    fn from(err: AccountingError) -> Self {
        match err {
            AccountingError::Io(e) => CtmonError::Io(e),
            other => CtmonError::Accounting(other.to_string()),
        }
    }
}
