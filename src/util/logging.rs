//! Structured logging setup for gamesmith
//!
//! Console or JSON lines, always on stderr so `--format json` output on
//! stdout stays parseable. The global subscriber is installed at most once.
//!
//! ```no_run
//! use gamesmith::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(thread = "gen_u1_1", "Pipeline started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "GAMESMITH_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "GAMESMITH_LOG_JSON";

static INSTALLED: Once = Once::new();

/// Directives applied when `RUST_LOG` is unset; HTTP internals are chatty at debug
const DEPENDENCY_DIRECTIVES: [&str; 3] = ["h2=warn", "hyper=warn", "genai=info"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
    /// Module path such as `gamesmith::pipeline`
    pub include_target: bool,
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON with source locations, for log collectors
    pub fn production() -> Self {
        Self {
            use_json: true,
            include_location: true,
            ..Default::default()
        }
    }

    /// Level from `GAMESMITH_LOG_LEVEL`, format from `GAMESMITH_LOG_JSON`
    pub fn from_env() -> Self {
        let level = env::var(LOG_LEVEL_ENV)
            .map(|raw| parse_level(&raw))
            .unwrap_or(Level::INFO);
        Self {
            level,
            use_json: json_requested(),
            ..Default::default()
        }
    }
}

/// True when `GAMESMITH_LOG_JSON` holds a truthy value
pub fn json_requested() -> bool {
    matches!(
        env::var(LOG_JSON_ENV).as_deref().map(str::trim),
        Ok("true") | Ok("1") | Ok("yes")
    )
}

/// Case-insensitive level name; unknown names fall back to INFO with a warning on stderr
pub fn parse_level(raw: &str) -> Level {
    match raw.trim().parse::<Level>() {
        Ok(level) => level,
        Err(_) => {
            eprintln!(
                "Invalid log level '{}', using info (expected trace, debug, info, warn or error)",
                raw
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let rust_log_set = env::var("RUST_LOG").is_ok();
    let own = format!("gamesmith={}", level);

    std::iter::once(own.as_str())
        .chain(DEPENDENCY_DIRECTIVES.into_iter().filter(|_| !rust_log_set))
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive)
}

/// Installs the global subscriber; only the first call has any effect
pub fn init_logging(config: LoggingConfig) {
    INSTALLED.call_once(|| {
        let json = config.use_json.then(|| {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
        });
        let text = (!config.use_json).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
        });

        tracing_subscriber::registry()
            .with(build_filter(config.level))
            .with(json)
            .with(text)
            .init();
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level(" WARN "), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_configs() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);

        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);

        assert_eq!(LoggingConfig::with_level(Level::DEBUG).level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(LOG_LEVEL_ENV, "debug");
        env::set_var(LOG_JSON_ENV, "1");
        let config = LoggingConfig::from_env();
        env::remove_var(LOG_LEVEL_ENV);
        env::remove_var(LOG_JSON_ENV);

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert!(!LoggingConfig::from_env().use_json);
    }

    #[test]
    fn test_build_filter_includes_crate_directive() {
        let filter = build_filter(Level::DEBUG);
        assert!(filter
            .to_string()
            .to_lowercase()
            .contains("gamesmith=debug"));
    }
}
