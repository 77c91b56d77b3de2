//! 수집 루프 -- 이벤트 스트림을 파서 -> 필터 -> 누산기로 흘려보냅니다.
//!
//! [`FlowIngestor`]는 줄 단위 텍스트 스트림을 끝까지 읽으면서 각 라인을 처리하고,
//! 집계된 흐름마다 [`RolloverScheduler`]로 분 경계를 확인하여 리포트를 출력합니다.
//!
//! # 데이터 흐름
//! ```text
//! AsyncBufRead ──line──▶ EventParser ──▶ FlowFilter ──▶ AccountingStore::record
//!                                                            │
//!                          RolloverScheduler::observe ◀──────┘
//!                                   │ Flush
//!                                   ▼
//!             AccountingStore::collect_and_reset ──▶ report::render ──▶ AsyncWrite
//! ```
//!
//! # 종료 조건
//! - 스트림 종료: 마지막 리포트를 출력하고 [`AccountingError::StreamTerminated`] 반환
//! - 취소 토큰: 마지막 리포트를 출력하고 `Ok(IngestStats)` 반환
//! - 스트림 읽기 에러: [`AccountingError::Io`] 반환
//!
//! 최대 라인 길이를 넘는 라인은 끝까지 버퍼링하지 않고 읽는 중에 버립니다.

use std::sync::Arc;

use chrono::{DateTime, Local};
use ctmon_core::config::CtmonConfig;
use ctmon_core::metrics as m;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::AccountingError;
use crate::filter::{FilterVerdict, FlowFilter};
use crate::lines::{BoundedLines, Segment};
use crate::parser::EventParser;
use crate::report;
use crate::rollover::{Clock, RolloverDecision, RolloverScheduler, SystemClock};
use crate::store::AccountingStore;

/// 수집 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// 읽은 라인 수 (빈 줄 포함)
    pub lines: u64,
    /// 집계된 흐름 수
    pub accepted: u64,
    /// 필터에서 거부된 흐름 수
    pub rejected: u64,
    /// 파싱 실패로 버려진 라인 수
    pub malformed: u64,
    /// 수행된 롤오버 수
    pub rollovers: u64,
    /// 리포트 쓰기 실패 수
    pub sink_failures: u64,
}

/// 한 라인의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 빈 줄
    Skipped,
    /// 파싱 실패
    Malformed,
    /// 필터에서 거부됨
    Rejected(FilterVerdict),
    /// 집계됨, 롤오버 판정 포함
    Accepted(RolloverDecision),
}

/// 이벤트 수집기
pub struct FlowIngestor {
    parser: EventParser,
    filter: FlowFilter,
    store: Arc<AccountingStore>,
    scheduler: RolloverScheduler,
    clock: Arc<dyn Clock>,
    stats: IngestStats,
}

impl FlowIngestor {
    /// 공유 누산기에 대한 참조를 반환합니다.
    pub fn store(&self) -> &Arc<AccountingStore> {
        &self.store
    }

    /// 지금까지의 수집 통계를 반환합니다.
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// 이벤트 라인 하나를 파싱, 필터링, 집계합니다.
    ///
    /// 집계된 경우에만 `now`로 롤오버 여부를 판정합니다.
    /// 판정 결과가 [`RolloverDecision::Flush`]이면 호출자가 [`rollover`](Self::rollover)를 호출해야 합니다.
    pub fn ingest_line(&mut self, line: &str, now: DateTime<Local>) -> LineOutcome {
        self.stats.lines += 1;
        metrics::counter!(m::LINES_READ_TOTAL).increment(1);

        if line.trim().is_empty() {
            return LineOutcome::Skipped;
        }

        let flow = match self.parser.parse(line) {
            Ok(flow) => flow,
            Err(e) => {
                self.stats.malformed += 1;
                metrics::counter!(m::PARSE_ERRORS_TOTAL).increment(1);
                warn!(error = %e, line, "discarding malformed conntrack event");
                return LineOutcome::Malformed;
            }
        };

        let verdict = self.filter.verdict(&flow);
        if verdict != FilterVerdict::Accepted {
            self.stats.rejected += 1;
            metrics::counter!(m::FLOWS_REJECTED_TOTAL, m::LABEL_REASON => verdict.reason())
                .increment(1);
            trace!(
                source = %flow.source(),
                dport = flow.original.dport,
                reason = verdict.reason(),
                "flow rejected"
            );
            return LineOutcome::Rejected(verdict);
        }

        self.store.record(&flow);
        self.stats.accepted += 1;
        metrics::counter!(m::FLOWS_ACCEPTED_TOTAL).increment(1);

        LineOutcome::Accepted(self.scheduler.observe(now))
    }

    /// 현재 윈도우를 수집/초기화하고 리포트를 sink에 씁니다.
    ///
    /// 쓰기에 실패하면 수집한 윈도우를 누산기에 되돌려 다음 리포트에 포함시킵니다.
    /// 성공 시 리포트에 포함된 출발지 주소 수를 반환합니다.
    pub async fn rollover<W>(&mut self, sink: &mut W) -> Result<usize, AccountingError>
    where
        W: AsyncWrite + Unpin,
    {
        let now = self.clock.now();
        let mut entries = self.store.collect_and_reset();
        let count = entries.len();
        let text = report::render(&mut entries, now.naive_local());

        self.stats.rollovers += 1;
        metrics::counter!(m::ROLLOVERS_TOTAL).increment(1);
        metrics::gauge!(m::WINDOW_SOURCES).set(count as f64);

        let written = async {
            sink.write_all(text.as_bytes()).await?;
            sink.flush().await
        }
        .await;

        if let Err(e) = written {
            self.stats.sink_failures += 1;
            metrics::counter!(m::REPORT_WRITE_FAILURES_TOTAL).increment(1);
            error!(error = %e, sources = count, "failed to write report, window carried over");
            self.store.restore(entries);
            return Err(AccountingError::SinkWrite(e));
        }

        info!(sources = count, "accounting window flushed");
        Ok(count)
    }

    /// 스트림이 끝나거나 취소될 때까지 이벤트를 수집합니다.
    pub async fn run<R, W>(
        &mut self,
        reader: R,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<IngestStats, AccountingError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BoundedLines::new(reader, self.parser.max_line_length());
        info!("event ingestion started");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("ingestion cancelled, flushing final report");
                    self.flush_remaining(sink).await;
                    return Ok(self.stats);
                }
                next = lines.next_segment() => next?,
            };

            let raw = match next {
                Some(Segment::Line(raw)) => raw,
                Some(Segment::Oversized(len)) => {
                    self.discard_oversized(len);
                    continue;
                }
                None => {
                    warn!(
                        lines = self.stats.lines,
                        accepted = self.stats.accepted,
                        "event stream closed"
                    );
                    self.flush_remaining(sink).await;
                    return Err(AccountingError::StreamTerminated);
                }
            };

            let now = self.clock.now();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\r');

            if self.ingest_line(line, now) == LineOutcome::Accepted(RolloverDecision::Flush) {
                // 실패는 rollover 안에서 기록되고 윈도우는 복원됨
                let _ = self.rollover(sink).await;
            }
        }
    }

    /// 최대 길이를 넘어 읽는 중에 버려진 라인을 파싱 실패로 집계합니다.
    fn discard_oversized(&mut self, len: usize) {
        self.stats.lines += 1;
        self.stats.malformed += 1;
        metrics::counter!(m::LINES_READ_TOTAL).increment(1);
        metrics::counter!(m::PARSE_ERRORS_TOTAL).increment(1);
        warn!(
            length = len,
            max = self.parser.max_line_length(),
            "discarding oversized conntrack event"
        );
    }

    async fn flush_remaining<W>(&mut self, sink: &mut W)
    where
        W: AsyncWrite + Unpin,
    {
        if self.store.is_empty() {
            debug!("no pending flows, skipping final report");
            return;
        }
        let _ = self.rollover(sink).await;
    }
}

/// [`FlowIngestor`] 빌더
///
/// # 사용 예시
/// ```
/// use std::sync::Arc;
/// use ctmon_accounting::{AccountingStore, FlowIngestorBuilder};
///
/// let store = Arc::new(AccountingStore::new());
/// let ingestor = FlowIngestorBuilder::new().store(Arc::clone(&store)).build();
/// assert!(ingestor.store().is_empty());
/// ```
pub struct FlowIngestorBuilder {
    parser: EventParser,
    filter: FlowFilter,
    store: Option<Arc<AccountingStore>>,
    clock: Arc<dyn Clock>,
}

impl FlowIngestorBuilder {
    /// 기본 파서/필터/시스템 시계로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            parser: EventParser::new(),
            filter: FlowFilter::default(),
            store: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// 설정 파일의 파서/필터 설정을 적용합니다.
    pub fn config(mut self, config: &CtmonConfig) -> Self {
        self.parser = EventParser::new().with_max_line_length(config.source.max_line_length);
        self.filter = FlowFilter::from_config(&config.filter);
        self
    }

    /// 파서를 설정합니다.
    pub fn parser(mut self, parser: EventParser) -> Self {
        self.parser = parser;
        self
    }

    /// 필터를 설정합니다.
    pub fn filter(mut self, filter: FlowFilter) -> Self {
        self.filter = filter;
        self
    }

    /// 공유 누산기를 설정합니다. 설정하지 않으면 새로 만듭니다.
    pub fn store(mut self, store: Arc<AccountingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 시계를 설정합니다.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 수집기를 생성합니다. 롤오버 기준 분은 생성 시각입니다.
    pub fn build(self) -> FlowIngestor {
        let scheduler = RolloverScheduler::new(self.clock.now());
        FlowIngestor {
            parser: self.parser,
            filter: self.filter,
            store: self.store.unwrap_or_default(),
            scheduler,
            clock: self.clock,
            stats: IngestStats::default(),
        }
    }
}

impl Default for FlowIngestorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
