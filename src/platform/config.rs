// logtrail - platform/config.rs
//
// config.toml location, loading, and validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. Values given on the command line override
// everything read here; see main.rs.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Platform-default location of config.toml, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", constants::APP_ID)
        .map(|dirs| dirs.config_dir().join(constants::CONFIG_FILE_NAME))
}

// =============================================================================
// Raw file shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[api]` section.
    pub api: ApiSection,
    /// `[tail]` section.
    pub tail: TailSection,
    /// `[filter]` section.
    pub filter: FilterSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[api]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Node API URL page requests are POSTed to.
    pub endpoint: Option<String>,
    /// Entries requested per page.
    pub page_size: Option<u64>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    /// First log index to request.
    pub start_index: Option<u64>,
    /// "stop" or "sleep".
    pub on_empty: Option<String>,
    /// Pause after an empty page when sleeping, in seconds.
    pub idle_secs: Option<u64>,
}

/// `[filter]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Content unit the `views` report counts.
    pub unit_uri: Option<String>,
    /// File the `files` report counts.
    pub file_uri: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated config
// =============================================================================

/// Validated configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // -- API --
    pub endpoint: String,
    pub page_size: u64,
    pub timeout_secs: u64,

    // -- Tail --
    pub start_index: u64,
    /// Sleep and retry on an empty page instead of stopping.
    pub follow: bool,
    pub idle_secs: u64,

    // -- Filter --
    pub unit_uri: Option<String>,
    pub file_uri: Option<String>,

    // -- Logging --
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            page_size: constants::DEFAULT_PAGE_SIZE,
            timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            start_index: constants::DEFAULT_START_INDEX,
            follow: false,
            idle_secs: constants::DEFAULT_IDLE_SECS,
            unit_uri: None,
            file_uri: None,
            log_level: None,
        }
    }
}

/// Load and validate a config file.
///
/// `explicit` is true when the path came from `--config`. An explicit file
/// must exist and parse; the platform-default file may be absent (first run)
/// and an unreadable or unparseable default file only produces a warning.
///
/// Returns the validated config and a list of non-fatal warnings.
pub fn load_config(
    path: &Path,
    explicit: bool,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    if !explicit && !path.exists() {
        return Ok((AppConfig::default(), warnings));
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if explicit => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                path.display()
            ));
            return Ok((AppConfig::default(), warnings));
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) if explicit => {
            return Err(ConfigError::TomlParse {
                path: path.to_path_buf(),
                source: e,
            })
        }
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                path.display()
            ));
            return Ok((AppConfig::default(), warnings));
        }
    };

    let (config, mut field_warnings) = validate(raw);
    warnings.append(&mut field_warnings);
    Ok((config, warnings))
}

/// Check each field against the named bounds in `util::constants`,
/// accumulating a warning for every rejected value.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- API: endpoint --
    if let Some(endpoint) = raw.api.endpoint {
        let trimmed = endpoint.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            config.endpoint = trimmed.to_string();
        } else {
            warnings.push(format!(
                "[api] endpoint = \"{endpoint}\" is not an http(s) URL. Using default ({}).",
                constants::DEFAULT_ENDPOINT,
            ));
        }
    }

    // -- API: page_size --
    if let Some(size) = raw.api.page_size {
        if (constants::MIN_PAGE_SIZE..=constants::MAX_PAGE_SIZE).contains(&size) {
            config.page_size = size;
        } else {
            warnings.push(format!(
                "[api] page_size = {size} is out of range ({}-{}). Using default ({}).",
                constants::MIN_PAGE_SIZE,
                constants::MAX_PAGE_SIZE,
                constants::DEFAULT_PAGE_SIZE,
            ));
        }
    }

    // -- API: timeout_secs --
    if let Some(secs) = raw.api.timeout_secs {
        if (constants::MIN_REQUEST_TIMEOUT_SECS..=constants::MAX_REQUEST_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.timeout_secs = secs;
        } else {
            warnings.push(format!(
                "[api] timeout_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REQUEST_TIMEOUT_SECS,
                constants::MAX_REQUEST_TIMEOUT_SECS,
                constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ));
        }
    }

    // -- Tail: start_index --
    if let Some(start) = raw.tail.start_index {
        config.start_index = start;
    }

    // -- Tail: on_empty --
    if let Some(ref mode) = raw.tail.on_empty {
        match mode.to_lowercase().as_str() {
            "stop" => config.follow = false,
            "sleep" => config.follow = true,
            other => warnings.push(format!(
                "[tail] on_empty = \"{other}\" is not recognised. \
                 Expected \"stop\" or \"sleep\". Using default (stop).",
            )),
        }
    }

    // -- Tail: idle_secs --
    if let Some(secs) = raw.tail.idle_secs {
        if (constants::MIN_IDLE_SECS..=constants::MAX_IDLE_SECS).contains(&secs) {
            config.idle_secs = secs;
        } else {
            warnings.push(format!(
                "[tail] idle_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_IDLE_SECS,
                constants::MAX_IDLE_SECS,
                constants::DEFAULT_IDLE_SECS,
            ));
        }
    }

    // -- Filter: targets --
    config.unit_uri = raw.filter.unit_uri.filter(|uri| !uri.is_empty());
    config.file_uri = raw.filter.file_uri.filter(|uri| !uri.is_empty());

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}
