#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use chrono::{Local, TimeZone};
use libfuzzer_sys::fuzz_target;

use ctmon_accounting::{AccountingStore, FlowIngestorBuilder, LineOutcome};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 이벤트 라인과 도착 시각 오프셋(초) 목록
    lines: Vec<(String, u16)>,
}

fuzz_target!(|input: FuzzInput| {
    let store = Arc::new(AccountingStore::new());
    let mut ingestor = FlowIngestorBuilder::new()
        .store(Arc::clone(&store))
        .build();

    let Some(base) = Local.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).earliest() else {
        return;
    };

    // 라인 수를 제한하여 실행 시간을 억제
    for (line, offset) in input.lines.iter().take(64) {
        let now = base + chrono::Duration::seconds(i64::from(*offset));
        let before = store.len();
        match ingestor.ingest_line(line, now) {
            LineOutcome::Accepted(_) => assert!(store.len() >= before.max(1)),
            _ => assert_eq!(store.len(), before),
        }
    }

    let stats = ingestor.stats();
    assert_eq!(
        stats.lines,
        input.lines.len().min(64) as u64,
        "every line is counted exactly once"
    );
    assert!(stats.accepted + stats.rejected + stats.malformed <= stats.lines);
});
