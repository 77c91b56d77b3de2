//! 메트릭 상수 및 설명 등록
//!
//! ctmon의 모든 Prometheus 메트릭 이름과 설명을 중앙에서 정의합니다.
//! 집계 크레이트는 이 상수로 `metrics::counter!()`, `metrics::gauge!()`를 호출하고,
//! 데몬은 레코더 설치 후 [`describe_all`]을 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `ctmon_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 필터 거부 사유 레이블 키 (packets, bytes, port)
pub const LABEL_REASON: &str = "reason";

// ─── 수집 메트릭 ────────────────────────────────────────────────────

/// 입력 스트림에서 읽은 이벤트 라인 수 (counter)
pub const LINES_READ_TOTAL: &str = "ctmon_lines_read_total";

/// 파싱에 실패하여 버려진 라인 수 (counter)
pub const PARSE_ERRORS_TOTAL: &str = "ctmon_parse_errors_total";

/// 필터를 통과하여 집계된 흐름 수 (counter)
pub const FLOWS_ACCEPTED_TOTAL: &str = "ctmon_flows_accepted_total";

/// 필터에서 거부된 흐름 수 (counter, label: reason)
pub const FLOWS_REJECTED_TOTAL: &str = "ctmon_flows_rejected_total";

// ─── 롤오버 / 리포트 메트릭 ──────────────────────────────────────────

/// 수행된 롤오버 수 (counter)
pub const ROLLOVERS_TOTAL: &str = "ctmon_rollovers_total";

/// 리포트 쓰기 실패 수 (counter)
pub const REPORT_WRITE_FAILURES_TOTAL: &str = "ctmon_report_write_failures_total";

/// 마지막으로 플러시된 윈도우의 출발지 주소 수 (gauge)
pub const WINDOW_SOURCES: &str = "ctmon_window_sources";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        LINES_READ_TOTAL,
        "Total number of conntrack event lines read from the source"
    );
    describe_counter!(
        PARSE_ERRORS_TOTAL,
        "Total number of event lines discarded as malformed"
    );
    describe_counter!(
        FLOWS_ACCEPTED_TOTAL,
        "Total number of flows recorded into the accounting window"
    );
    describe_counter!(
        FLOWS_REJECTED_TOTAL,
        "Flows rejected by the acceptance filter, by reason"
    );
    describe_counter!(ROLLOVERS_TOTAL, "Total number of accounting window rollovers");
    describe_counter!(
        REPORT_WRITE_FAILURES_TOTAL,
        "Total number of reports that could not be written to the sink"
    );
    describe_gauge!(
        WINDOW_SOURCES,
        "Number of source addresses in the most recently flushed window"
    );
}
