// logtrail - core/model.rs
//
// Wire data model of the node's action log API. Pure data definitions with
// no I/O; the HTTP exchange lives in platform::http.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants::{RTT_BLOCK_LOG, RTT_PAGE_REQUEST, RTT_SERVICE_STATISTICS};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

// =============================================================================
// Page request / response envelope
// =============================================================================

/// Body of one page request sent to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Request-type tag, always `RTT_PAGE_REQUEST`.
    pub rtt: u64,
    /// Index of the first entry wanted (the cursor).
    pub start_index: u64,
    /// Upper bound on the number of entries returned.
    pub max_count: u64,
}

impl PageRequest {
    pub fn new(start_index: u64, max_count: u64) -> Self {
        Self {
            rtt: RTT_PAGE_REQUEST,
            start_index,
            max_count,
        }
    }
}

/// One page of the action log. Other envelope fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub actions: Vec<LogEntry>,
}

// =============================================================================
// Log entry
// =============================================================================

/// A single record of the append-only action log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    /// Position in the log, assigned by the node. Strictly increasing.
    pub index: u64,

    /// Whether this record applies or reverts `action`.
    pub logging_type: LoggingType,

    /// The logged action.
    pub action: Action,
}

/// Forward application or undo of a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingType {
    Apply,
    Revert,
}

impl LoggingType {
    /// Tag string as it appears on the wire and in output rows.
    pub fn label(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Revert => "revert",
        }
    }

    /// Multiplier for counts extracted from the action: reverts undo them.
    pub fn sign(self) -> i64 {
        match self {
            Self::Apply => 1,
            Self::Revert => -1,
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A logged action, identified on the wire by its integer `rtt` tag.
///
/// Only the tags some report inspects are decoded into a concrete shape;
/// everything else is kept as `Other` so new action types on the node never
/// break a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    BlockLog(BlockLog),
    ServiceStatistics(ServiceStatistics),
    Other { rtt: u64 },
}

impl Action {
    /// Wire tag of this action.
    pub fn rtt(&self) -> u64 {
        match self {
            Self::BlockLog(_) => RTT_BLOCK_LOG,
            Self::ServiceStatistics(_) => RTT_SERVICE_STATISTICS,
            Self::Other { rtt } => *rtt,
        }
    }

    /// Visit this action and every action nested in it, depth-first,
    /// parents before children, in wire order.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Action),
    {
        visit(self);
        if let Self::BlockLog(block) = self {
            for transaction in block.transactions.iter().flatten() {
                transaction.action.walk(visit);
            }
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Decode the generic envelope first, then branch on the tag into the
        // variant's own shape so a miskeyed payload fails loudly.
        let value = serde_json::Value::deserialize(deserializer)?;
        let rtt = value
            .get("rtt")
            .ok_or_else(|| <D::Error as de::Error>::missing_field("rtt"))?
            .as_u64()
            .ok_or_else(|| {
                <D::Error as de::Error>::custom("action `rtt` is not an unsigned integer")
            })?;

        match rtt {
            RTT_BLOCK_LOG => BlockLog::deserialize(value)
                .map(Self::BlockLog)
                .map_err(|e| {
                    <D::Error as de::Error>::custom(format!("block log (rtt {rtt}): {e}"))
                }),
            RTT_SERVICE_STATISTICS => ServiceStatistics::deserialize(value)
                .map(Self::ServiceStatistics)
                .map_err(|e| {
                    <D::Error as de::Error>::custom(format!("service statistics (rtt {rtt}): {e}"))
                }),
            _ => Ok(Self::Other { rtt }),
        }
    }
}

/// A block appended to the chain, with everything it changed.
///
/// The two lists are `None` when the key is absent from the payload. A
/// report that needs one fails on `None` rather than reading it as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockLog {
    pub block_number: u64,
    #[serde(default)]
    pub block_hash: String,
    pub authority: String,
    pub unit_uri_impacts: Option<Vec<UnitUriImpact>>,
    pub transactions: Option<Vec<TransactionLog>>,
}

/// View counts a block attributes to one content unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitUriImpact {
    pub content_unit_uri: String,
    pub views_per_channel: Vec<ChannelViews>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelViews {
    pub channel_address: String,
    pub view_count: u64,
}

/// A transaction included in a block. Fields other than the action
/// (fee, hash, timestamps) are not needed by any report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionLog {
    pub action: Action,
}

/// Usage statistics a storage server reports for the files it served.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatistics {
    pub server_address: String,
    pub file_items: Vec<FileItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileItem {
    pub file_uri: String,
    pub unit_uri: String,
    pub count_items: Vec<CountItem>,
}

/// Number of times a peer was served a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountItem {
    pub count: u64,
    pub peer_address: String,
}
