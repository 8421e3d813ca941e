// logtrail - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (CLI flags take precedence)
// 3. Logging initialisation (debug mode support)
// 4. Merging flags over config values into the run settings
// 5. Running the tail loop with the selected report
//
// Any error ends the process with exit status 1.

use clap::{Parser, Subcommand};
use logtrail::app::tail::{EmptyPageBehavior, LogTailer, TailConfig, TailSummary};
use logtrail::core::report::{BlocksReport, ChannelViewsReport, FileCountsReport, Report};
use logtrail::platform::config::{self, AppConfig};
use logtrail::platform::http::HttpSource;
use logtrail::util;
use logtrail::util::constants::{MAX_IDLE_SECS, MAX_PAGE_SIZE, MIN_IDLE_SECS, MIN_PAGE_SIZE};
use logtrail::util::error::{ConfigError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// logtrail - tail a node's action log and print count rows as TSV.
///
/// Rows go to stdout, one per matched count, tab-separated, no header.
/// Diagnostics go to stderr.
#[derive(Parser, Debug)]
#[command(name = "logtrail", version, about)]
struct Cli {
    #[command(subcommand)]
    report: ReportCommand,

    /// Node API URL page requests are POSTed to.
    #[arg(short = 'e', long, global = true)]
    endpoint: Option<String>,

    /// Entries requested per page.
    #[arg(
        short = 'n',
        long = "page-size",
        global = true,
        value_parser = clap::value_parser!(u64).range(MIN_PAGE_SIZE..=MAX_PAGE_SIZE)
    )]
    page_size: Option<u64>,

    /// First log index to request.
    #[arg(short = 's', long = "start-index", global = true)]
    start_index: Option<u64>,

    /// Keep polling after the log is drained instead of exiting.
    #[arg(short = 'f', long, global = true)]
    follow: bool,

    /// Exit once the log is drained, even if config.toml says to sleep.
    #[arg(long, global = true, conflicts_with = "follow")]
    stop: bool,

    /// Seconds to wait after an empty page in follow mode.
    #[arg(
        long = "idle-secs",
        global = true,
        value_parser = clap::value_parser!(u64).range(MIN_IDLE_SECS..=MAX_IDLE_SECS)
    )]
    idle_secs: Option<u64>,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Views per channel attributed to one content unit.
    Views {
        /// Content unit URI to count views for ([filter] unit_uri).
        #[arg(long = "unit-uri")]
        unit_uri: Option<String>,
    },
    /// Per-peer serve counts reported by storage servers for one file.
    Files {
        /// File URI to count serves for ([filter] file_uri).
        #[arg(long = "file-uri")]
        file_uri: Option<String>,
    },
    /// One row per block: hash, authority, and transaction count.
    Blocks,
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging exists; its warnings are replayed below.
    let (app_config, config_path, warnings) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = ?config_path,
        "logtrail starting"
    );
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    match run(&cli, &app_config) {
        Ok(summary) => tracing::info!(
            pages = summary.pages,
            entries = summary.entries,
            rows = summary.rows,
            cursor = summary.cursor,
            "Log drained; tail stopped"
        ),
        Err(e) => {
            tracing::error!(error = %e, "Tail aborted");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Resolve and load config.toml: `--config` if given, else the platform default.
fn load_config(
    cli: &Cli,
) -> std::result::Result<(AppConfig, Option<PathBuf>, Vec<String>), ConfigError> {
    let (path, explicit) = match &cli.config {
        Some(path) => (Some(path.clone()), true),
        None => (config::default_config_path(), false),
    };

    match path {
        Some(path) => {
            let (app_config, warnings) = config::load_config(&path, explicit)?;
            Ok((app_config, Some(path), warnings))
        }
        None => Ok((AppConfig::default(), None, Vec::new())),
    }
}

/// Report selected by the subcommand, with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReportTarget {
    Views(String),
    Files(String),
    Blocks,
}

impl ReportTarget {
    fn into_report(self) -> Box<dyn Report> {
        match self {
            Self::Views(unit_uri) => Box::new(ChannelViewsReport::new(unit_uri)),
            Self::Files(file_uri) => Box::new(FileCountsReport::new(file_uri)),
            Self::Blocks => Box::new(BlocksReport),
        }
    }
}

/// Everything one run needs. Each value comes from its flag if given,
/// else from config.toml, else from the built-in default.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    target: ReportTarget,
    endpoint: String,
    timeout: Duration,
    tail: TailConfig,
    /// Flags that were given but have no effect on this run.
    warnings: Vec<String>,
}

fn resolve(cli: &Cli, config: &AppConfig) -> std::result::Result<RunSettings, ConfigError> {
    let target = match &cli.report {
        ReportCommand::Views { unit_uri } => unit_uri
            .clone()
            .or_else(|| config.unit_uri.clone())
            .map(ReportTarget::Views)
            .ok_or(ConfigError::MissingTarget {
                report: "views",
                flag: "--unit-uri",
                key: "[filter] unit_uri",
            })?,
        ReportCommand::Files { file_uri } => file_uri
            .clone()
            .or_else(|| config.file_uri.clone())
            .map(ReportTarget::Files)
            .ok_or(ConfigError::MissingTarget {
                report: "files",
                flag: "--file-uri",
                key: "[filter] file_uri",
            })?,
        ReportCommand::Blocks => ReportTarget::Blocks,
    };

    let mut warnings = Vec::new();
    let follow = (cli.follow || config.follow) && !cli.stop;
    let on_empty = if follow {
        EmptyPageBehavior::SleepAndRetry(Duration::from_secs(
            cli.idle_secs.unwrap_or(config.idle_secs),
        ))
    } else {
        if let Some(idle) = cli.idle_secs {
            warnings.push(format!(
                "--idle-secs {idle} ignored: the run stops at the first empty page \
                 (pass --follow or set [tail] on_empty = \"sleep\")"
            ));
        }
        EmptyPageBehavior::Stop
    };

    Ok(RunSettings {
        target,
        endpoint: cli
            .endpoint
            .clone()
            .unwrap_or_else(|| config.endpoint.clone()),
        timeout: Duration::from_secs(config.timeout_secs),
        tail: TailConfig {
            page_size: cli.page_size.unwrap_or(config.page_size),
            start_index: cli.start_index.unwrap_or(config.start_index),
            on_empty,
        },
        warnings,
    })
}

fn run(cli: &Cli, config: &AppConfig) -> Result<TailSummary> {
    let settings = resolve(cli, config)?;
    for warning in &settings.warnings {
        tracing::warn!("{}", warning);
    }

    let source = HttpSource::new(&settings.endpoint, settings.timeout)?;
    let stdout = std::io::stdout().lock();
    let mut tailer = LogTailer::new(
        source,
        settings.target.into_report(),
        stdout,
        settings.tail,
    );
    tailer.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("logtrail").chain(args.iter().copied())).unwrap()
    }

    fn settings(args: &[&str], config: &AppConfig) -> RunSettings {
        resolve(&parse(args), config).unwrap()
    }

    #[test]
    fn test_defaults_without_flags_or_config() {
        let s = settings(&["blocks"], &AppConfig::default());
        assert_eq!(s.target, ReportTarget::Blocks);
        assert_eq!(s.endpoint, util::constants::DEFAULT_ENDPOINT);
        assert_eq!(
            s.tail,
            TailConfig {
                page_size: util::constants::DEFAULT_PAGE_SIZE,
                start_index: util::constants::DEFAULT_START_INDEX,
                on_empty: EmptyPageBehavior::Stop,
            }
        );
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn test_config_values_beat_defaults() {
        let config = AppConfig {
            endpoint: "http://10.0.0.5:14111/api".to_string(),
            page_size: 500,
            timeout_secs: 7,
            start_index: 120_000,
            unit_uri: Some("FROM_CONFIG".to_string()),
            ..AppConfig::default()
        };
        let s = settings(&["views"], &config);
        assert_eq!(s.target, ReportTarget::Views("FROM_CONFIG".to_string()));
        assert_eq!(s.endpoint, "http://10.0.0.5:14111/api");
        assert_eq!(s.timeout, Duration::from_secs(7));
        assert_eq!(s.tail.page_size, 500);
        assert_eq!(s.tail.start_index, 120_000);
    }

    #[test]
    fn test_flags_beat_config_values() {
        let config = AppConfig {
            endpoint: "http://10.0.0.5:14111/api".to_string(),
            page_size: 500,
            start_index: 120_000,
            file_uri: Some("FROM_CONFIG".to_string()),
            ..AppConfig::default()
        };
        let s = settings(
            &[
                "files",
                "--file-uri",
                "FROM_FLAG",
                "-e",
                "http://node:1/api",
                "-n",
                "20",
                "-s",
                "7",
            ],
            &config,
        );
        assert_eq!(s.target, ReportTarget::Files("FROM_FLAG".to_string()));
        assert_eq!(s.endpoint, "http://node:1/api");
        assert_eq!(s.tail.page_size, 20);
        assert_eq!(s.tail.start_index, 7);
    }

    #[test]
    fn test_global_flags_accepted_after_subcommand_and_before() {
        let before = settings(&["-n", "20", "blocks"], &AppConfig::default());
        let after = settings(&["blocks", "-n", "20"], &AppConfig::default());
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_target_is_config_error() {
        let err = resolve(&parse(&["views"]), &AppConfig::default()).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingTarget { flag: "--unit-uri", .. }),
            "{err}"
        );

        let err = resolve(&parse(&["files"]), &AppConfig::default()).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingTarget { flag: "--file-uri", .. }),
            "{err}"
        );
    }

    #[test]
    fn test_follow_uses_config_idle_secs() {
        let config = AppConfig {
            idle_secs: 15,
            ..AppConfig::default()
        };
        let s = settings(&["blocks", "--follow"], &config);
        assert_eq!(
            s.tail.on_empty,
            EmptyPageBehavior::SleepAndRetry(Duration::from_secs(15))
        );

        let s = settings(&["blocks", "--follow", "--idle-secs", "2"], &config);
        assert_eq!(
            s.tail.on_empty,
            EmptyPageBehavior::SleepAndRetry(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_config_sleep_is_followed_without_flag() {
        let config = AppConfig {
            follow: true,
            ..AppConfig::default()
        };
        let s = settings(&["blocks"], &config);
        assert_eq!(
            s.tail.on_empty,
            EmptyPageBehavior::SleepAndRetry(Duration::from_secs(
                util::constants::DEFAULT_IDLE_SECS
            ))
        );
    }

    #[test]
    fn test_stop_flag_overrides_config_sleep() {
        let config = AppConfig {
            follow: true,
            ..AppConfig::default()
        };
        let s = settings(&["blocks", "--stop"], &config);
        assert_eq!(s.tail.on_empty, EmptyPageBehavior::Stop);
    }

    #[test]
    fn test_stop_conflicts_with_follow() {
        let result = Cli::try_parse_from(["logtrail", "blocks", "--follow", "--stop"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_idle_secs_without_follow_warns() {
        let s = settings(&["blocks", "--idle-secs", "5"], &AppConfig::default());
        assert_eq!(s.tail.on_empty, EmptyPageBehavior::Stop);
        assert_eq!(s.warnings.len(), 1);
        assert!(s.warnings[0].contains("--idle-secs 5"), "{}", s.warnings[0]);
    }

    #[test]
    fn test_out_of_range_page_size_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["logtrail", "blocks", "-n", "0"]);
        assert!(result.is_err());
    }
}
