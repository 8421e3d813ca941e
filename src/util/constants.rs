// logtrail - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Config validation and CLI defaults both read from here.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logtrail";

/// Application identifier used for config directories.
pub const APP_ID: &str = "logtrail";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Node API wire protocol
// =============================================================================

/// Request-type tag of a page request (`LoggedTransactionsRequest`).
pub const RTT_PAGE_REQUEST: u64 = 54;

/// Action tag of a block record in the action log.
pub const RTT_BLOCK_LOG: u64 = 11;

/// Action tag of a storage node's service statistics report.
pub const RTT_SERVICE_STATISTICS: u64 = 35;

/// Default API endpoint of a locally running node.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:14111/api";

/// Default number of entries requested per page.
///
/// The node caps the actual response size on its side, so this is an upper
/// bound rather than a guarantee.
pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Minimum user-configurable page size.
pub const MIN_PAGE_SIZE: u64 = 1;

/// Maximum user-configurable page size.
pub const MAX_PAGE_SIZE: u64 = 1_000_000;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum user-configurable request timeout in seconds.
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable request timeout in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// Tail loop
// =============================================================================

/// Default first log index to request.
pub const DEFAULT_START_INDEX: u64 = 0;

/// Default pause after an empty page in follow mode (seconds).
pub const DEFAULT_IDLE_SECS: u64 = 60;

/// Minimum user-configurable idle pause (seconds).
pub const MIN_IDLE_SECS: u64 = 1;

/// Maximum user-configurable idle pause (seconds).
pub const MAX_IDLE_SECS: u64 = 3_600;

// =============================================================================
// Output
// =============================================================================

/// Field separator of emitted rows.
pub const ROW_DELIMITER: u8 = b'\t';

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
