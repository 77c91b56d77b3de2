//! 리포트 렌더러 -- 윈도우 스냅샷을 순위가 매겨진 텍스트로 변환합니다.
//!
//! # 출력 형식
//! ```text
//! Time: 2024-05-01 12:01:00
//!                                   10.0.0.1       25         2500
//!                                   10.0.0.9       12         1100
//!
//! ```
//! 필드 순서(주소, 패킷, 바이트)와 마지막 빈 줄은 로그 수집 도구가 의존하므로 유지해야 합니다.

use std::cmp::Ordering;
use std::fmt::Write;
use std::net::IpAddr;

use chrono::NaiveDateTime;

use crate::store::AccountingEntry;

/// 헤더 타임스탬프 형식
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ADDR_WIDTH: usize = 40;
const PACKETS_WIDTH: usize = 8;
const BYTES_WIDTH: usize = 12;

/// 두 엔트리의 순서를 비교합니다.
///
/// 바이트 내림차순, 패킷 내림차순, 주소 오름차순입니다.
/// 주소가 다르면 절대 `Equal`이 되지 않으므로 전순서입니다.
pub fn compare(a: &(IpAddr, AccountingEntry), b: &(IpAddr, AccountingEntry)) -> Ordering {
    b.1.bytes
        .cmp(&a.1.bytes)
        .then_with(|| b.1.packets.cmp(&a.1.packets))
        .then_with(|| a.0.cmp(&b.0))
}

/// 엔트리를 리포트 순서로 정렬합니다.
pub fn rank(entries: &mut [(IpAddr, AccountingEntry)]) {
    entries.sort_unstable_by(compare);
}

/// 스냅샷을 리포트 순서로 정렬한 뒤 텍스트로 렌더링합니다.
///
/// 입력 순서(맵 순회 순서)와 관계없이 같은 스냅샷은 같은 텍스트를 만듭니다.
pub fn render(entries: &mut [(IpAddr, AccountingEntry)], at: NaiveDateTime) -> String {
    rank(entries);

    let mut out = String::with_capacity(32 + entries.len() * (ADDR_WIDTH + 26));
    // String에 대한 write!는 실패하지 않음
    let _ = writeln!(out, "Time: {}", at.format(TIMESTAMP_FORMAT));
    for (addr, entry) in entries.iter() {
        let _ = writeln!(
            out,
            "  {:>aw$} {:>pw$} {:>bw$}",
            addr.to_string(),
            entry.packets,
            entry.bytes,
            aw = ADDR_WIDTH,
            pw = PACKETS_WIDTH,
            bw = BYTES_WIDTH,
        );
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::*;

    fn entry(addr: &str, packets: u64, bytes: u64) -> (IpAddr, AccountingEntry) {
        (addr.parse().unwrap(), AccountingEntry { packets, bytes })
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 1, 0)
            .unwrap()
    }

    #[test]
    fn bytes_dominate_packets_dominate_address() {
        let mut entries = vec![
            entry("10.0.0.3", 100, 500),
            entry("10.0.0.2", 5, 900),
            entry("10.0.0.9", 10, 900),
            entry("10.0.0.1", 10, 900),
        ];
        rank(&mut entries);
        let order: Vec<String> = entries.iter().map(|(a, _)| a.to_string()).collect();
        assert_eq!(order, vec!["10.0.0.1", "10.0.0.9", "10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn ipv4_sorts_before_ipv6_on_full_tie() {
        let mut entries = vec![entry("::1", 1, 1), entry("255.255.255.255", 1, 1)];
        rank(&mut entries);
        assert!(entries[0].0.is_ipv4());
    }

    #[test]
    fn large_differences_do_not_wrap() {
        let mut entries = vec![entry("10.0.0.1", 0, 1), entry("10.0.0.2", 0, u64::MAX)];
        rank(&mut entries);
        assert_eq!(entries[0].0.to_string(), "10.0.0.2");
    }

    #[test]
    fn render_layout() {
        let text = render(
            &mut [entry("10.0.0.2", 5, 500), entry("10.0.0.1", 20, 2000)],
            noon(),
        );
        let lines: Vec<&str> = text.split('\n').collect();

        assert_eq!(lines[0], "Time: 2024-05-01 12:01:00");
        assert_eq!(
            lines[1],
            format!("  {:>40} {:>8} {:>12}", "10.0.0.1", 20, 2000)
        );
        assert_eq!(lines[2], format!("  {:>40} {:>8} {:>12}", "10.0.0.2", 5, 500));
        // 마지막 빈 줄 구분자
        assert!(text.ends_with("\n\n"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn empty_snapshot_renders_header_and_separator() {
        assert_eq!(render(&mut [], noon()), "Time: 2024-05-01 12:01:00\n\n");
    }

    #[test]
    fn field_order_is_address_packets_bytes() {
        let text = render(&mut [entry("2001:db8::1", 7, 9000)], noon());
        let fields: Vec<&str> = text.lines().nth(1).unwrap().split_whitespace().collect();
        assert_eq!(fields, vec!["2001:db8::1", "7", "9000"]);
    }

    proptest! {
        #[test]
        fn render_is_independent_of_input_order(
            raw in proptest::collection::hash_map(any::<u32>(), (0u64..50, 0u64..50), 0..30)
        ) {
            let mut entries: Vec<(IpAddr, AccountingEntry)> = raw
                .into_iter()
                .map(|(ip, (packets, bytes))| {
                    (IpAddr::from(ip.to_be_bytes()), AccountingEntry { packets, bytes })
                })
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();

            prop_assert_eq!(render(&mut entries, noon()), render(&mut reversed, noon()));
        }

        #[test]
        fn distinct_entries_never_compare_equal(
            a in (any::<u32>(), 0u64..4, 0u64..4),
            b in (any::<u32>(), 0u64..4, 0u64..4),
        ) {
            let ea = (IpAddr::from(a.0.to_be_bytes()), AccountingEntry { packets: a.1, bytes: a.2 });
            let eb = (IpAddr::from(b.0.to_be_bytes()), AccountingEntry { packets: b.1, bytes: b.2 });
            prop_assume!(ea.0 != eb.0);
            prop_assert_ne!(compare(&ea, &eb), Ordering::Equal);
            prop_assert_eq!(compare(&ea, &eb), compare(&eb, &ea).reverse());
        }
    }
}
