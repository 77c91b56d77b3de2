//! 흐름 레코드 타입
//!
//! conntrack는 추적 중인 연결 하나를 두 방향의 카운터로 보고합니다.
//! 연결을 시작한 쪽에서 본 `original` 방향과 응답 경로인 `reply` 방향입니다.

use std::net::{IpAddr, Ipv4Addr};

/// 추적 연결의 한 방향 카운터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowDirection {
    /// 출발지 주소
    pub src: IpAddr,
    /// 목적지 주소
    pub dst: IpAddr,
    /// 출발지 포트
    pub sport: u16,
    /// 목적지 포트
    pub dport: u16,
    /// 패킷 수
    pub packets: u64,
    /// 바이트 수
    pub bytes: u64,
}

impl Default for FlowDirection {
    fn default() -> Self {
        Self {
            src: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            dst: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            sport: 0,
            dport: 0,
            packets: 0,
            bytes: 0,
        }
    }
}

/// 양방향 흐름 레코드
///
/// 이벤트 라인의 첫 번째 `src=` 토큰이 `original`을, 두 번째가 `reply`를 채웁니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowRecord {
    /// 연결 시작 쪽 방향
    pub original: FlowDirection,
    /// 응답 방향
    pub reply: FlowDirection,
}

impl FlowRecord {
    /// 집계 키: original 방향의 출발지 주소
    pub fn source(&self) -> IpAddr {
        self.original.src
    }

    /// 양방향 합산 패킷 수
    pub fn total_packets(&self) -> u64 {
        self.original.packets.saturating_add(self.reply.packets)
    }

    /// 양방향 합산 바이트 수
    pub fn total_bytes(&self) -> u64 {
        self.original.bytes.saturating_add(self.reply.bytes)
    }
}
