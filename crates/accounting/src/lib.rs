//! ctmon 트래픽 집계 엔진
//!
//! 커널 conntrack가 내보내는 연결 종료 이벤트 스트림을 읽어, 관심 있는 흐름만 골라
//! 출발지 주소별 트래픽 양을 집계하고, 분 경계마다 순위 리포트를 출력합니다.
//!
//! # 모듈 구성
//!
//! - [`parser`]: `key=value` 이벤트 라인 -> [`FlowRecord`] (original/reply 방향 구분)
//! - [`filter`]: 패킷/바이트 임계값과 목적지 포트 기반 수용 필터
//! - [`store`]: 뮤텍스로 보호되는 출발지별 누산기 (swap-on-reset)
//! - [`rollover`]: 벽시계 분 경계 롤오버 스케줄러
//! - [`report`]: 결정적 정렬 + 고정폭 텍스트 리포트
//! - [`ingest`]: 스트림 수집 루프
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! conntrack -E ─▶ FlowIngestor ─▶ EventParser ─▶ FlowFilter ─▶ AccountingStore
//!                      │                                            │
//!                      └── RolloverScheduler ── Flush ─▶ collect_and_reset ─▶ report ─▶ sink
//! ```

pub mod error;
pub mod filter;
pub mod flow;
pub mod ingest;
mod lines;
pub mod parser;
pub mod report;
pub mod rollover;
pub mod store;

// --- 주요 타입 re-export ---

pub use error::AccountingError;
pub use filter::{FilterVerdict, FlowFilter};
pub use flow::{FlowDirection, FlowRecord};
pub use ingest::{FlowIngestor, FlowIngestorBuilder, IngestStats, LineOutcome};
pub use parser::EventParser;
pub use rollover::{Clock, RolloverDecision, RolloverScheduler, SystemClock};
pub use store::{AccountingEntry, AccountingStore, Snapshot};
