//! 길이 제한 라인 리더
//!
//! 개행이 오지 않는 입력이 메모리를 무한히 차지하지 않도록,
//! 최대 길이를 넘은 라인은 버퍼에 쌓지 않고 개행까지 건너뜁니다.

use std::io;
use std::mem;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// 한 번의 읽기 결과
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    /// 개행을 제외한 라인 내용
    Line(Vec<u8>),
    /// 최대 길이를 넘어 버려진 라인의 바이트 수
    Oversized(usize),
}

/// `\n` 단위 리더, 라인당 최대 `max_len` 바이트만 보관
pub(crate) struct BoundedLines<R> {
    reader: R,
    buf: Vec<u8>,
    max_len: usize,
    /// 현재 라인에서 버린 바이트 수 (0이면 정상 누적 중)
    skipped: usize,
}

impl<R> BoundedLines<R>
where
    R: AsyncBufRead + Unpin,
{
    pub(crate) fn new(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_len,
            skipped: 0,
        }
    }

    /// 다음 라인을 읽습니다. 스트림 끝이면 `None`.
    ///
    /// 마지막 라인에 개행이 없어도 반환합니다.
    pub(crate) async fn next_segment(&mut self) -> io::Result<Option<Segment>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.buf.is_empty() && self.skipped == 0 {
                    return Ok(None);
                }
                return Ok(Some(self.finish()));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = match newline {
                Some(i) => &available[..i],
                None => available,
            };

            if self.skipped == 0 && self.buf.len() + chunk.len() <= self.max_len {
                self.buf.extend_from_slice(chunk);
            } else {
                self.skipped += self.buf.len() + chunk.len();
                self.buf.clear();
            }

            let used = chunk.len() + usize::from(newline.is_some());
            self.reader.consume(used);

            if newline.is_some() {
                return Ok(Some(self.finish()));
            }
        }
    }

    fn finish(&mut self) -> Segment {
        if self.skipped > 0 {
            Segment::Oversized(mem::take(&mut self.skipped))
        } else {
            Segment::Line(mem::take(&mut self.buf))
        }
    }
}
