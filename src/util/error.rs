// logtrail - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every runtime error is fatal to the tail loop; `main` reports the chain
// and exits non-zero.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logtrail operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogTrailError {
    /// The node API could not be reached or answered with a failure.
    Transport(TransportError),

    /// The node API answered, but not with a well-formed page.
    Decode(DecodeError),

    /// Writing rows to the output stream failed.
    Output(OutputError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogTrailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {e}"),
            Self::Decode(e) => write!(f, "Decode error: {e}"),
            Self::Output(e) => write!(f, "Output error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogTrailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Output(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Errors raised while exchanging a page request with the node.
#[derive(Debug)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The node answered with a non-2xx status.
    Status { endpoint: String, status: u16 },

    /// The response body could not be read.
    Body {
        endpoint: String,
        source: reqwest::Error,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { endpoint, source } => {
                write!(f, "request to '{endpoint}' failed: {source}")
            }
            Self::Status { endpoint, status } => {
                write!(f, "'{endpoint}' answered with HTTP status {status}")
            }
            Self::Body { endpoint, source } => {
                write!(f, "could not read response body from '{endpoint}': {source}")
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request { source, .. } => Some(source),
            Self::Body { source, .. } => Some(source),
            Self::Status { .. } => None,
        }
    }
}

impl From<TransportError> for LogTrailError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Errors raised while interpreting a page returned by the node.
#[derive(Debug)]
pub enum DecodeError {
    /// Body is not valid JSON, lacks `actions`, or holds a malformed entry.
    Json {
        endpoint: String,
        source: serde_json::Error,
    },

    /// An entry index does not advance past the cursor. Accepting it would
    /// re-read entries or loop forever on the same page.
    OutOfOrder { cursor: u64, index: u64 },

    /// A block at `index` lacks the list the selected report reads.
    MissingField { index: u64, field: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { endpoint, source } => {
                write!(f, "malformed page from '{endpoint}': {source}")
            }
            Self::OutOfOrder { cursor, index } => write!(
                f,
                "entry index {index} does not advance past cursor {cursor}"
            ),
            Self::MissingField { index, field } => {
                write!(f, "block log at index {index} has no `{field}` field")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::OutOfOrder { .. } | Self::MissingField { .. } => None,
        }
    }
}

impl From<DecodeError> for LogTrailError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

/// Errors related to writing rows.
#[derive(Debug)]
pub enum OutputError {
    /// Row serialisation or the underlying write failed.
    Write { source: csv::Error },

    /// Flushing the output stream failed.
    Flush { source: io::Error },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { source } => write!(f, "could not write row: {source}"),
            Self::Flush { source } => write!(f, "could not flush output: {source}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source } => Some(source),
            Self::Flush { source } => Some(source),
        }
    }
}

impl From<OutputError> for LogTrailError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The selected report needs a target URI and none was given.
    MissingTarget {
        report: &'static str,
        flag: &'static str,
        key: &'static str,
    },

    /// The HTTP client could not be constructed.
    Client { source: reqwest::Error },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::MissingTarget { report, flag, key } => write!(
                f,
                "The '{report}' report needs a target: pass {flag} or set {key} in config.toml"
            ),
            Self::Client { source } => write!(f, "Could not build HTTP client: {source}"),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Client { source } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogTrailError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for logtrail results.
pub type Result<T> = std::result::Result<T, LogTrailError>;
