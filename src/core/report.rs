// logtrail - core/report.rs
//
// Reports: the filter predicate and row formatter applied to every log
// entry. Each report walks the entry's action tree, keeps the records that
// match its target, and yields one row per leaf count.
// Core layer: pure logic, no I/O.
//
// Row layout: index, apply/revert tag, context columns, signed count.
//
// A block that lacks the list a report reads is an error, never zero rows:
// an absent key must not pass for "no matches".

use crate::core::model::{Action, BlockLog, LogEntry};
use crate::util::error::DecodeError;

/// One output row. Written as tab-joined fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    /// Start a row with the columns every report shares.
    fn for_entry(entry: &LogEntry) -> Self {
        Self(vec![
            entry.index.to_string(),
            entry.logging_type.label().to_string(),
        ])
    }

    fn push(mut self, field: impl ToString) -> Self {
        self.0.push(field.to_string());
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

/// A filter predicate plus row formatter over log entries.
///
/// Implementations must be pure functions of the entry: the tailer may be
/// restarted from any index and must reproduce the same rows.
pub trait Report {
    /// Short name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Append the rows `entry` yields to `out`. `sign` is the entry's
    /// apply/revert multiplier and scales every emitted count.
    fn collect(
        &self,
        entry: &LogEntry,
        sign: i64,
        out: &mut Vec<Row>,
    ) -> Result<(), DecodeError>;

    /// Rows yielded by one entry, in wire order.
    fn rows(&self, entry: &LogEntry) -> Result<Vec<Row>, DecodeError> {
        let mut out = Vec::new();
        self.collect(entry, entry.logging_type.sign(), &mut out)?;
        Ok(out)
    }
}

fn as_block(entry: &LogEntry) -> Option<&BlockLog> {
    match &entry.action {
        Action::BlockLog(block) => Some(block),
        _ => None,
    }
}

fn required<'a, T>(
    entry: &LogEntry,
    list: &'a Option<Vec<T>>,
    field: &'static str,
) -> Result<&'a [T], DecodeError> {
    list.as_deref().ok_or(DecodeError::MissingField {
        index: entry.index,
        field,
    })
}

fn signed(count: u64, sign: i64) -> i64 {
    // Saturates rather than wraps on counts past i64::MAX.
    i64::try_from(count).unwrap_or(i64::MAX) * sign
}

// =============================================================================
// views: channel views of one content unit
// =============================================================================

/// Views per channel attributed to one content unit by each block.
///
/// Columns: index, tag, block_number, authority, channel_address, views.
#[derive(Debug, Clone)]
pub struct ChannelViewsReport {
    pub unit_uri: String,
}

impl ChannelViewsReport {
    pub fn new(unit_uri: impl Into<String>) -> Self {
        Self {
            unit_uri: unit_uri.into(),
        }
    }
}

impl Report for ChannelViewsReport {
    fn name(&self) -> &'static str {
        "views"
    }

    fn collect(
        &self,
        entry: &LogEntry,
        sign: i64,
        out: &mut Vec<Row>,
    ) -> Result<(), DecodeError> {
        let Some(block) = as_block(entry) else {
            return Ok(());
        };
        let impacts = required(entry, &block.unit_uri_impacts, "unit_uri_impacts")?;

        for impact in impacts
            .iter()
            .filter(|impact| impact.content_unit_uri == self.unit_uri)
        {
            for views in &impact.views_per_channel {
                out.push(
                    Row::for_entry(entry)
                        .push(block.block_number)
                        .push(&block.authority)
                        .push(&views.channel_address)
                        .push(signed(views.view_count, sign)),
                );
            }
        }
        Ok(())
    }
}

// =============================================================================
// files: service statistics counts of one file
// =============================================================================

/// Per-peer serve counts storage servers reported for one file.
///
/// Columns: index, tag, block_number, server_address, peer_address,
/// unit_uri, file_uri, count.
#[derive(Debug, Clone)]
pub struct FileCountsReport {
    pub file_uri: String,
}

impl FileCountsReport {
    pub fn new(file_uri: impl Into<String>) -> Self {
        Self {
            file_uri: file_uri.into(),
        }
    }
}

impl Report for FileCountsReport {
    fn name(&self) -> &'static str {
        "files"
    }

    fn collect(
        &self,
        entry: &LogEntry,
        sign: i64,
        out: &mut Vec<Row>,
    ) -> Result<(), DecodeError> {
        let Some(block) = as_block(entry) else {
            return Ok(());
        };
        let transactions = required(entry, &block.transactions, "transactions")?;

        for transaction in transactions {
            transaction.action.walk(&mut |action| {
                let Action::ServiceStatistics(stats) = action else {
                    return;
                };
                for item in stats
                    .file_items
                    .iter()
                    .filter(|item| item.file_uri == self.file_uri)
                {
                    for count_item in &item.count_items {
                        out.push(
                            Row::for_entry(entry)
                                .push(block.block_number)
                                .push(&stats.server_address)
                                .push(&count_item.peer_address)
                                .push(&item.unit_uri)
                                .push(&item.file_uri)
                                .push(signed(count_item.count, sign)),
                        );
                    }
                }
            });
        }
        Ok(())
    }
}

// =============================================================================
// blocks: one row per block
// =============================================================================

/// Block headers, with the signed number of transactions each carried.
///
/// Columns: index, tag, block_number, block_hash, authority, transactions.
#[derive(Debug, Clone, Default)]
pub struct BlocksReport;

impl Report for BlocksReport {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn collect(
        &self,
        entry: &LogEntry,
        sign: i64,
        out: &mut Vec<Row>,
    ) -> Result<(), DecodeError> {
        let Some(block) = as_block(entry) else {
            return Ok(());
        };
        let transactions = required(entry, &block.transactions, "transactions")?;

        out.push(
            Row::for_entry(entry)
                .push(block.block_number)
                .push(&block.block_hash)
                .push(&block.authority)
                .push(signed(transactions.len() as u64, sign)),
        );
        Ok(())
    }
}
