//! conntrack 이벤트 라인 파서
//!
//! `conntrack -E` 출력 한 줄을 [`FlowRecord`]로 변환합니다.
//!
//! # 입력 형식
//! ```text
//!  [DESTROY] tcp      6 src=10.0.0.1 dst=10.0.0.2 sport=51234 dport=443 packets=20 bytes=2000 \
//!      src=10.0.0.2 dst=10.0.0.1 sport=443 dport=51234 packets=5 bytes=500 [ASSURED] mark=0
//! ```
//!
//! 공백으로 토큰을 나누고 `key=value` 형태가 아닌 토큰은 무시합니다.
//! 같은 키가 두 방향에 반복되므로, 첫 번째 `src=`는 original 방향을,
//! 두 번째 `src=`는 reply 방향을 가리키도록 커서를 옮깁니다.
//! 세 번째 `src=`는 에러입니다.
//!
//! # 사용 예시
//! ```
//! use ctmon_accounting::parser::EventParser;
//!
//! let parser = EventParser::new();
//! let flow = parser.parse("src=10.0.0.1 dst=10.0.0.2 sport=1 dport=443 packets=20 bytes=2000")?;
//! assert_eq!(flow.original.dport, 443);
//! # Ok::<(), ctmon_accounting::AccountingError>(())
//! ```

use std::net::IpAddr;
use std::str::FromStr;

use crate::error::AccountingError;
use crate::flow::{FlowDirection, FlowRecord};

/// 기본 최대 라인 길이 (바이트)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// 현재 값을 채우는 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// 아직 `src=`를 만나지 않음
    None,
    Original,
    Reply,
}

/// conntrack 이벤트 파서
///
/// 상태가 없으므로 여러 라인에 재사용할 수 있습니다.
#[derive(Debug, Clone)]
pub struct EventParser {
    /// 최대 허용 라인 길이 (바이트)
    max_line_length: usize,
}

impl EventParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// 최대 허용 라인 길이를 반환합니다.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// 이벤트 라인 한 줄을 파싱합니다.
    ///
    /// 인식하는 키는 `src`, `dst`, `sport`, `dport`, `packets`, `bytes`이며
    /// 나머지 키는 무시합니다. 인식한 키의 값이 잘못되면 라인 전체가 실패합니다.
    pub fn parse(&self, line: &str) -> Result<FlowRecord, AccountingError> {
        if line.len() > self.max_line_length {
            return Err(AccountingError::malformed(
                0,
                format!(
                    "line too long: {} bytes (max: {})",
                    line.len(),
                    self.max_line_length
                ),
            ));
        }

        let mut flow = FlowRecord::default();
        let mut cursor = Cursor::None;

        for (idx, token) in line.split_whitespace().enumerate() {
            let position = idx + 1;
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };

            if key == "src" {
                cursor = match cursor {
                    Cursor::None => Cursor::Original,
                    Cursor::Original => Cursor::Reply,
                    Cursor::Reply => {
                        return Err(AccountingError::malformed(
                            position,
                            format!("unexpected third direction: src={value}"),
                        ));
                    }
                };
            } else if !is_known_key(key) {
                continue;
            }

            let direction = match cursor {
                Cursor::None => {
                    return Err(AccountingError::malformed(
                        position,
                        format!("'{key}' appears before any src="),
                    ));
                }
                Cursor::Original => &mut flow.original,
                Cursor::Reply => &mut flow.reply,
            };

            assign(direction, key, value, position)?;
        }

        if cursor == Cursor::None {
            return Err(AccountingError::malformed(0, "no flow direction (missing src=)"));
        }

        Ok(flow)
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(key, "dst" | "sport" | "dport" | "packets" | "bytes")
}

fn assign(
    direction: &mut FlowDirection,
    key: &str,
    value: &str,
    position: usize,
) -> Result<(), AccountingError> {
    match key {
        "src" => direction.src = parse_field::<IpAddr>(key, value, position)?,
        "dst" => direction.dst = parse_field::<IpAddr>(key, value, position)?,
        "sport" => direction.sport = parse_field::<u16>(key, value, position)?,
        "dport" => direction.dport = parse_field::<u16>(key, value, position)?,
        "packets" => direction.packets = parse_field::<u64>(key, value, position)?,
        "bytes" => direction.bytes = parse_field::<u64>(key, value, position)?,
        _ => {}
    }
    Ok(())
}

fn parse_field<T>(key: &str, value: &str, position: usize) -> Result<T, AccountingError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    // 정수 FromStr은 앞의 '+'를 허용하지만 conntrack 출력에는 부호가 없음
    if value.starts_with('+') {
        return Err(AccountingError::malformed(
            position,
            format!("invalid {key} value '{value}': unexpected sign"),
        ));
    }
    value.parse::<T>().map_err(|e| {
        AccountingError::malformed(position, format!("invalid {key} value '{value}': {e}"))
    })
}
