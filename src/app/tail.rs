// logtrail - app/tail.rs
//
// Log tailer: pulls the node's action log page by page, runs every entry
// through a report and streams the resulting rows to the output.
//
// Architecture:
//   - `ActionSource` is the seam to the node; platform::http provides the
//     HTTP implementation, tests provide scripted ones.
//   - The loop is an explicit state machine. `poll_once` takes the current
//     `TailState` by value and returns the next one; the cursor is never
//     mutated in place.
//   - Everything runs on the calling thread. The only pause is the idle
//     sleep after an empty page in follow mode.
//
// Failure policy: any transport, decode, or output error ends the run and
// propagates to the caller. There is no retry; a restarted run rescans from
// its start index. A page is printed only once every entry in it has been
// checked and formatted.

use crate::core::export::RowWriter;
use crate::core::model::{LogEntry, Page, PageRequest};
use crate::core::report::Report;
use crate::util::error::{DecodeError, Result};
use std::io::Write;
use std::time::Duration;

// =============================================================================
// Public types
// =============================================================================

/// Where pages of the action log come from.
pub trait ActionSource {
    /// Human-readable location of the log, for diagnostics.
    fn endpoint(&self) -> &str;

    /// Fetch one page. An empty page means the log has no entries at or
    /// after `request.start_index` yet.
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page>;
}

/// What to do when the node returns an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPageBehavior {
    /// The log is drained: end the run.
    Stop,
    /// Wait, then poll again from the same cursor.
    SleepAndRetry(Duration),
}

/// Loop parameters of a tail run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// `max_count` sent with every page request.
    pub page_size: u64,
    /// First log index requested.
    pub start_index: u64,
    pub on_empty: EmptyPageBehavior,
}

/// Loop state carried between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailState {
    /// Index of the next entry to request.
    pub cursor: u64,
}

impl TailState {
    pub fn new(cursor: u64) -> Self {
        Self { cursor }
    }

    /// State after consuming a page whose last entry had `last_index`.
    fn advance_past(self, last_index: u64) -> Self {
        Self {
            cursor: last_index.saturating_add(1),
        }
    }
}

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// The page had entries; `next` resumes after the last of them.
    Advanced {
        next: TailState,
        entries: usize,
        rows: usize,
    },
    /// The page was empty; the state is unchanged.
    Empty(TailState),
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailSummary {
    /// Non-empty pages consumed.
    pub pages: u64,
    /// Log entries examined.
    pub entries: u64,
    /// Rows written.
    pub rows: u64,
    /// Cursor at the end of the run.
    pub cursor: u64,
}

// =============================================================================
// LogTailer
// =============================================================================

/// Drives the page loop for one report over one source.
pub struct LogTailer<S: ActionSource, W: Write> {
    source: S,
    report: Box<dyn Report>,
    writer: RowWriter<W>,
    config: TailConfig,
    pages: u64,
    entries: u64,
}

impl<S: ActionSource, W: Write> LogTailer<S, W> {
    pub fn new(source: S, report: Box<dyn Report>, output: W, config: TailConfig) -> Self {
        Self {
            source,
            report,
            writer: RowWriter::new(output),
            config,
            pages: 0,
            entries: 0,
        }
    }

    /// Request one page at `state.cursor`, write the rows it yields and
    /// return the state to continue from.
    pub fn poll_once(&mut self, state: TailState) -> Result<Poll> {
        let request = PageRequest::new(state.cursor, self.config.page_size);
        tracing::debug!(
            start_index = request.start_index,
            max_count = request.max_count,
            "Requesting page"
        );

        let page = self.source.fetch_page(&request)?;
        let Some(last_index) = page.actions.last().map(|entry| entry.index) else {
            tracing::debug!(cursor = state.cursor, "Empty page");
            return Ok(Poll::Empty(state));
        };

        // Validate the whole page before emitting anything from it.
        check_order(state.cursor, &page.actions)?;
        let page_rows = page
            .actions
            .iter()
            .map(|entry| self.report.rows(entry))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut rows = 0;
        for entry_rows in page_rows.iter().filter(|r| !r.is_empty()) {
            for row in entry_rows {
                self.writer.write_row(row)?;
            }
            self.writer.flush()?;
            rows += entry_rows.len();
        }

        let next = state.advance_past(last_index);
        self.pages += 1;
        self.entries += page.actions.len() as u64;

        tracing::debug!(
            entries = page.actions.len(),
            rows,
            next_cursor = next.cursor,
            "Page consumed"
        );

        Ok(Poll::Advanced {
            next,
            entries: page.actions.len(),
            rows,
        })
    }

    /// Poll until the log is drained (`Stop`) or forever (`SleepAndRetry`).
    pub fn run(&mut self) -> Result<TailSummary> {
        let mut state = TailState::new(self.config.start_index);

        tracing::info!(
            endpoint = self.source.endpoint(),
            report = self.report.name(),
            start_index = state.cursor,
            page_size = self.config.page_size,
            "Tail started"
        );

        loop {
            state = match self.poll_once(state)? {
                Poll::Advanced { next, .. } => next,
                Poll::Empty(current) => match self.config.on_empty {
                    EmptyPageBehavior::Stop => {
                        tracing::debug!(cursor = current.cursor, "Log drained");
                        return Ok(self.summary(current));
                    }
                    EmptyPageBehavior::SleepAndRetry(idle) => {
                        tracing::debug!(
                            cursor = current.cursor,
                            idle_ms = idle.as_millis() as u64,
                            "No new entries; sleeping"
                        );
                        std::thread::sleep(idle);
                        current
                    }
                },
            };
        }
    }

    /// Totals so far, ending at `state`.
    pub fn summary(&self, state: TailState) -> TailSummary {
        TailSummary {
            pages: self.pages,
            entries: self.entries,
            rows: self.writer.rows_written(),
            cursor: state.cursor,
        }
    }

    /// Tear the tailer down into its source and flushed output.
    pub fn into_parts(self) -> Result<(S, W)> {
        let output = self.writer.into_inner()?;
        Ok((self.source, output))
    }
}

/// Every entry must sit at or past the cursor and after its predecessor.
fn check_order(cursor: u64, entries: &[LogEntry]) -> std::result::Result<(), DecodeError> {
    let mut floor = cursor;
    for entry in entries {
        if entry.index < floor {
            return Err(DecodeError::OutOfOrder {
                cursor: floor,
                index: entry.index,
            });
        }
        floor = entry.index.saturating_add(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Action, BlockLog, ChannelViews, LoggingType, UnitUriImpact};
    use crate::core::report::ChannelViewsReport;
    use crate::util::error::{LogTrailError, TransportError};
    use std::collections::VecDeque;
    use std::time::Instant;

    /// Replays canned pages, then fails like an unreachable node.
    struct ScriptedSource {
        pages: VecDeque<Page>,
        requests: Vec<PageRequest>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Vec<LogEntry>>) -> Self {
            Self {
                pages: pages.into_iter().map(|actions| Page { actions }).collect(),
                requests: Vec::new(),
            }
        }
    }

    impl ActionSource for ScriptedSource {
        fn endpoint(&self) -> &str {
            "scripted"
        }

        fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
            self.requests.push(*request);
            self.pages.pop_front().ok_or_else(|| {
                TransportError::Status {
                    endpoint: "scripted".to_string(),
                    status: 503,
                }
                .into()
            })
        }
    }

    fn views_entry(index: u64, logging_type: LoggingType, view_count: u64) -> LogEntry {
        LogEntry {
            index,
            logging_type,
            action: Action::BlockLog(BlockLog {
                block_number: 100,
                block_hash: String::new(),
                authority: "A1".to_string(),
                unit_uri_impacts: Some(vec![UnitUriImpact {
                    content_unit_uri: "TARGET".to_string(),
                    views_per_channel: vec![ChannelViews {
                        channel_address: "C1".to_string(),
                        view_count,
                    }],
                }]),
                transactions: None,
            }),
        }
    }

    fn other_entry(index: u64) -> LogEntry {
        LogEntry {
            index,
            logging_type: LoggingType::Apply,
            action: Action::Other { rtt: 3 },
        }
    }

    fn tailer(
        pages: Vec<Vec<LogEntry>>,
        on_empty: EmptyPageBehavior,
    ) -> LogTailer<ScriptedSource, Vec<u8>> {
        LogTailer::new(
            ScriptedSource::new(pages),
            Box::new(ChannelViewsReport::new("TARGET")),
            Vec::new(),
            TailConfig {
                page_size: 10_000,
                start_index: 0,
                on_empty,
            },
        )
    }

    fn output(tailer: LogTailer<ScriptedSource, Vec<u8>>) -> (ScriptedSource, String) {
        let (source, out) = tailer.into_parts().unwrap();
        (source, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_entry_scenario() {
        let mut t = tailer(
            vec![vec![views_entry(5, LoggingType::Apply, 7)]],
            EmptyPageBehavior::Stop,
        );

        let poll = t.poll_once(TailState::new(0)).unwrap();
        assert_eq!(
            poll,
            Poll::Advanced {
                next: TailState::new(6),
                entries: 1,
                rows: 1
            }
        );

        let (source, out) = output(t);
        assert_eq!(source.requests, vec![PageRequest::new(0, 10_000)]);
        assert_eq!(out, "5\tapply\t100\tA1\tC1\t7\n");
    }

    #[test]
    fn test_revert_scenario() {
        let mut t = tailer(
            vec![vec![views_entry(5, LoggingType::Revert, 7)]],
            EmptyPageBehavior::Stop,
        );
        t.poll_once(TailState::new(0)).unwrap();
        let (_, out) = output(t);
        assert_eq!(out, "5\trevert\t100\tA1\tC1\t-7\n");
    }

    #[test]
    fn test_cursor_follows_last_index_of_each_page() {
        let mut t = tailer(
            vec![
                vec![views_entry(5, LoggingType::Apply, 1), other_entry(6)],
                vec![other_entry(9)],
                vec![],
            ],
            EmptyPageBehavior::Stop,
        );

        let summary = t.run().unwrap();
        assert_eq!(
            summary,
            TailSummary {
                pages: 2,
                entries: 3,
                rows: 1,
                cursor: 10
            }
        );

        let (source, _) = output(t);
        let starts: Vec<_> = source.requests.iter().map(|r| r.start_index).collect();
        assert_eq!(starts, vec![0, 7, 10]);
    }

    #[test]
    fn test_rows_follow_entry_order_across_pages() {
        let mut t = tailer(
            vec![
                vec![
                    views_entry(1, LoggingType::Apply, 3),
                    views_entry(2, LoggingType::Revert, 3),
                ],
                vec![views_entry(4, LoggingType::Apply, 8)],
                vec![],
            ],
            EmptyPageBehavior::Stop,
        );
        t.run().unwrap();

        let (_, out) = output(t);
        let indices: Vec<_> = out
            .lines()
            .map(|line| line.split('\t').next().unwrap().to_string())
            .collect();
        assert_eq!(indices, vec!["1", "2", "4"]);
    }

    #[test]
    fn test_empty_first_page_stops_without_rows() {
        let mut t = tailer(vec![vec![]], EmptyPageBehavior::Stop);

        let summary = t.run().unwrap();
        assert_eq!(summary, TailSummary::default());

        let (source, out) = output(t);
        assert_eq!(source.requests.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_sleep_and_retry_repeats_same_request_after_delay() {
        let idle = Duration::from_millis(50);
        let mut t = tailer(vec![vec![]], EmptyPageBehavior::SleepAndRetry(idle));

        let started = Instant::now();
        // The script runs dry on the second request, which ends the run.
        let err = t.run().unwrap_err();
        assert!(started.elapsed() >= idle);
        assert!(matches!(err, LogTrailError::Transport(_)), "{err}");

        let (source, out) = output(t);
        assert_eq!(source.requests.len(), 2);
        assert_eq!(source.requests[0], source.requests[1]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_start_index_is_first_cursor() {
        let mut t = tailer(vec![vec![]], EmptyPageBehavior::Stop);
        t.config.start_index = 1_234;
        let summary = t.run().unwrap();
        assert_eq!(summary.cursor, 1_234);

        let (source, _) = output(t);
        assert_eq!(source.requests[0].start_index, 1_234);
    }

    #[test]
    fn test_entry_before_cursor_is_rejected() {
        let mut t = tailer(
            vec![vec![other_entry(5)], vec![other_entry(3)]],
            EmptyPageBehavior::Stop,
        );
        let err = t.run().unwrap_err();
        assert!(
            matches!(
                err,
                LogTrailError::Decode(DecodeError::OutOfOrder {
                    cursor: 6,
                    index: 3
                })
            ),
            "{err}"
        );
    }

    #[test]
    fn test_non_increasing_page_emits_nothing() {
        let mut t = tailer(
            vec![vec![
                views_entry(5, LoggingType::Apply, 1),
                views_entry(5, LoggingType::Apply, 1),
            ]],
            EmptyPageBehavior::Stop,
        );
        assert!(t.poll_once(TailState::new(0)).is_err());

        let (_, out) = output(t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_entry_missing_report_field_rejects_whole_page() {
        let mut incomplete = views_entry(6, LoggingType::Apply, 1);
        if let Action::BlockLog(block) = &mut incomplete.action {
            block.unit_uri_impacts = None;
        }
        // The first entry alone would print a row.
        let mut t = tailer(
            vec![vec![views_entry(5, LoggingType::Apply, 1), incomplete]],
            EmptyPageBehavior::Stop,
        );

        let err = t.run().unwrap_err();
        assert!(
            matches!(
                err,
                LogTrailError::Decode(DecodeError::MissingField {
                    index: 6,
                    field: "unit_uri_impacts"
                })
            ),
            "{err}"
        );

        let (source, out) = output(t);
        assert_eq!(source.requests.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_source_error_propagates() {
        let mut t = tailer(Vec::new(), EmptyPageBehavior::Stop);
        let err = t.run().unwrap_err();
        assert!(err.to_string().contains("503"), "{err}");
    }
}
