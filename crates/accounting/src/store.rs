//! 출발지 주소별 트래픽 누산기
//!
//! [`AccountingStore`]는 현재 윈도우(주소 -> 누적 카운터 맵)를 단일 뮤텍스로 보호합니다.
//! 수집 루프가 [`record`](AccountingStore::record)로 갱신하고,
//! 롤오버 시 [`collect_and_reset`](AccountingStore::collect_and_reset)이
//! 맵 자체를 빈 맵으로 교체하여 이전 윈도우를 넘겨받습니다.
//!
//! # 락 범위
//! ```text
//! record()            : lock -> entry lookup/insert/add -> unlock
//! collect_and_reset() : lock -> mem::take(map)          -> unlock -> Vec 변환
//! snapshot()          : lock -> clone                   -> unlock
//! ```
//! 락을 잡은 채로 정렬, 포맷팅, I/O를 하지 않습니다.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::flow::FlowRecord;

/// 한 출발지 주소의 누적 카운터
///
/// 윈도우 안에서 처음 기여할 때 생성되고, 이후 더해지기만 합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountingEntry {
    /// 누적 패킷 수
    pub packets: u64,
    /// 누적 바이트 수
    pub bytes: u64,
}

impl AccountingEntry {
    fn add(&mut self, packets: u64, bytes: u64) {
        self.packets = self.packets.saturating_add(packets);
        self.bytes = self.bytes.saturating_add(bytes);
    }
}

/// 윈도우 스냅샷: (주소, 누적 카운터) 목록. 순서는 정해져 있지 않습니다.
pub type Snapshot = Vec<(IpAddr, AccountingEntry)>;

/// 동시성 안전 출발지별 누산기
///
/// 수집 태스크와 진단 덤프 태스크가 공유할 수 있도록 `Arc`로 감싸 사용합니다.
#[derive(Debug, Default)]
pub struct AccountingStore {
    window: Mutex<HashMap<IpAddr, AccountingEntry>>,
}

impl AccountingStore {
    /// 빈 윈도우로 새 누산기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 흐름을 original 방향 출발지 주소에 합산합니다.
    ///
    /// 양방향 패킷/바이트 합계를 더하며, 엔트리가 없으면 생성합니다.
    pub fn record(&self, flow: &FlowRecord) {
        let (packets, bytes) = (flow.total_packets(), flow.total_bytes());
        self.lock()
            .entry(flow.source())
            .or_default()
            .add(packets, bytes);
    }

    /// 현재 윈도우를 빈 윈도우로 교체하고 이전 윈도우의 엔트리를 반환합니다.
    ///
    /// 교체는 한 번의 락 획득 안에서 일어나므로, 동시에 들어온 흐름은
    /// 정확히 한 윈도우에만 기록됩니다.
    pub fn collect_and_reset(&self) -> Snapshot {
        let old = std::mem::take(&mut *self.lock());
        old.into_iter().collect()
    }

    /// 윈도우를 유지한 채 현재 엔트리의 복사본을 반환합니다 (진단용).
    pub fn snapshot(&self) -> Snapshot {
        let window = self.lock();
        window.iter().map(|(addr, entry)| (*addr, *entry)).collect()
    }

    /// 이전에 수집한 엔트리를 현재 윈도우에 다시 합산합니다.
    ///
    /// 리포트 출력에 실패한 윈도우를 버리지 않고 다음 리포트로 넘길 때 사용합니다.
    pub fn restore(&self, entries: Snapshot) {
        let mut window = self.lock();
        for (addr, entry) in entries {
            window
                .entry(addr)
                .or_default()
                .add(entry.packets, entry.bytes);
        }
    }

    /// 현재 윈도우의 출발지 주소 수
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 현재 윈도우가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // 맵에는 카운터만 있으므로 poison 이후에도 내용은 항상 유효함
    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, AccountingEntry>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
