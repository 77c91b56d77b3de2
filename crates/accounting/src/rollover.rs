//! 롤오버 스케줄러 -- 벽시계 분 경계에서 윈도우를 플러시합니다.
//!
//! 별도 타이머 스레드 없이, 이벤트가 도착할 때마다 도착 시각의 "분" 값을
//! 이전 관측 시각의 분 값과 비교합니다. 값이 바뀌면 플러시를 요청합니다.
//!
//! # 알려진 동작
//! - 윈도우 길이는 이벤트 도착 위상에 따라 최대 한 주기까지 달라집니다.
//! - 여러 분 동안 이벤트가 없으면 그 사이의 리포트는 생성되지 않고,
//!   다음 이벤트가 분 변화를 관측할 때 한 번만 플러시됩니다.
//! - 분 값만 비교하므로 정확히 한 시간 뒤 같은 분에 도착한 이벤트는 변화로 보지 않습니다.

use chrono::{DateTime, Local, Timelike};

/// 현재 시각 공급자
///
/// 테스트에서 시각을 주입할 수 있도록 trait으로 분리합니다.
pub trait Clock: Send + Sync {
    /// 현재 로컬 시각을 반환합니다.
    fn now(&self) -> DateTime<Local>;
}

/// 시스템 벽시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 관측 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverDecision {
    /// 현재 윈도우에 계속 누적
    Accumulate,
    /// 윈도우를 수집/초기화하고 리포트 출력
    Flush,
}

/// 분 경계 롤오버 스케줄러
#[derive(Debug, Clone)]
pub struct RolloverScheduler {
    /// 마지막으로 관측한 시각의 분 값
    last_minute: u32,
}

impl RolloverScheduler {
    /// 시작 시각의 분 값을 기준으로 스케줄러를 생성합니다.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            last_minute: start.minute(),
        }
    }

    /// 이벤트 도착 시각을 관측하고 플러시 여부를 반환합니다.
    ///
    /// 결과와 관계없이 관측 시각을 기준으로 갱신합니다.
    pub fn observe(&mut self, now: DateTime<Local>) -> RolloverDecision {
        let minute = now.minute();
        let decision = if minute != self.last_minute {
            RolloverDecision::Flush
        } else {
            RolloverDecision::Accumulate
        };
        self.last_minute = minute;
        decision
    }

    /// 마지막으로 관측한 분 값
    pub fn last_minute(&self) -> u32 {
        self.last_minute
    }
}
