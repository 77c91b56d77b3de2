//! 수용 필터 -- 집계할 가치가 있는 흐름만 통과시킵니다.
//!
//! conntrack 종료 이벤트는 양이 매우 많으므로, 알려진 웹 포트에서
//! 의미 있는 양을 전송한 흐름만 집계하여 CPU 비용과 누산기 메모리를 제한합니다.

use ctmon_core::config::FilterConfig;

use crate::flow::FlowRecord;

/// 필터 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    /// 집계 대상
    Accepted,
    /// 양방향 합산 패킷 수가 임계값 미만
    TooFewPackets,
    /// 양방향 합산 바이트 수가 임계값 미만
    TooFewBytes,
    /// original 방향 목적지 포트가 허용 목록에 없음
    PortNotAllowed,
}

impl FilterVerdict {
    /// 메트릭 레이블 값
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::TooFewPackets => "packets",
            Self::TooFewBytes => "bytes",
            Self::PortNotAllowed => "port",
        }
    }
}

/// 상태 없는 흐름 수용 필터
#[derive(Debug, Clone)]
pub struct FlowFilter {
    min_packets: u64,
    min_bytes: u64,
    allowed_ports: Vec<u16>,
}

impl FlowFilter {
    /// 설정으로부터 필터를 생성합니다.
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            min_packets: config.min_packets,
            min_bytes: config.min_bytes,
            allowed_ports: config.allowed_ports.clone(),
        }
    }

    /// 흐름을 판정합니다. 패킷 수, 바이트 수, 포트 순서로 검사합니다.
    pub fn verdict(&self, flow: &FlowRecord) -> FilterVerdict {
        if flow.total_packets() < self.min_packets {
            return FilterVerdict::TooFewPackets;
        }
        if flow.total_bytes() < self.min_bytes {
            return FilterVerdict::TooFewBytes;
        }
        if !self.allowed_ports.contains(&flow.original.dport) {
            return FilterVerdict::PortNotAllowed;
        }
        FilterVerdict::Accepted
    }

    /// 흐름이 집계 대상인지 반환합니다.
    pub fn accepts(&self, flow: &FlowRecord) -> bool {
        self.verdict(flow) == FilterVerdict::Accepted
    }
}

impl Default for FlowFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowDirection;

    fn flow(packets: (u64, u64), bytes: (u64, u64), dport: u16) -> FlowRecord {
        FlowRecord {
            original: FlowDirection {
                dport,
                packets: packets.0,
                bytes: bytes.0,
                ..FlowDirection::default()
            },
            reply: FlowDirection {
                packets: packets.1,
                bytes: bytes.1,
                ..FlowDirection::default()
            },
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        let filter = FlowFilter::default();
        assert!(filter.accepts(&flow((10, 0), (1024, 0), 80)));
        assert!(filter.accepts(&flow((5, 5), (512, 512), 443)));
    }

    #[test]
    fn just_below_thresholds_is_rejected() {
        let filter = FlowFilter::default();
        assert_eq!(
            filter.verdict(&flow((5, 4), (5000, 0), 443)),
            FilterVerdict::TooFewPackets
        );
        assert_eq!(
            filter.verdict(&flow((50, 0), (1000, 23), 443)),
            FilterVerdict::TooFewBytes
        );
    }

    #[test]
    fn port_outside_allowed_set_is_rejected_regardless_of_volume() {
        let filter = FlowFilter::default();
        assert_eq!(
            filter.verdict(&flow((1_000_000, 0), (u64::MAX, 0), 22)),
            FilterVerdict::PortNotAllowed
        );
    }

    #[test]
    fn only_original_destination_port_counts() {
        let filter = FlowFilter::default();
        let mut f = flow((10, 10), (2048, 2048), 51234);
        f.reply.dport = 443;
        assert!(!filter.accepts(&f));
    }

    #[test]
    fn custom_ports_from_config() {
        let filter = FlowFilter::from_config(&FilterConfig {
            min_packets: 0,
            min_bytes: 0,
            allowed_ports: vec![8443],
        });
        assert!(filter.accepts(&flow((0, 0), (0, 0), 8443)));
        assert!(!filter.accepts(&flow((0, 0), (0, 0), 443)));
    }

    #[test]
    fn verdict_reason_labels() {
        assert_eq!(FilterVerdict::TooFewPackets.reason(), "packets");
        assert_eq!(FilterVerdict::TooFewBytes.reason(), "bytes");
        assert_eq!(FilterVerdict::PortNotAllowed.reason(), "port");
    }
}
