use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Targets whose verbosity follows `--log-level`.
const CUELIGHTS_TARGETS: [&str; 4] = [
    "cuelights",
    "cuelights_link",
    "cuelights_frame",
    "cuelights_engine",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

/// `level` for the cuelights crates; anything else only at warn or above,
/// so `--log-level trace` shows decoder resyncs without dependency chatter.
fn filter(level: LogLevel) -> Targets {
    let level = LevelFilter::from(level);
    CUELIGHTS_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, level)
        })
        .with_default(LevelFilter::WARN.min(level))
}

/// Log to stderr; stdout is reserved for channel output.
///
/// Thread names are included so listener and dispatch lines can be told
/// apart from the operator's command thread.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);
    let registry = tracing_subscriber::registry().with(filter(level));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn level_applies_to_cuelights_crates() {
        let targets = filter(LogLevel::Debug);
        assert!(targets.would_enable("cuelights_frame::codec", &Level::DEBUG));
        assert!(targets.would_enable("cuelights_engine::listener", &Level::DEBUG));
        assert!(!targets.would_enable("cuelights_engine::listener", &Level::TRACE));
    }

    #[test]
    fn other_crates_stay_at_warn() {
        let targets = filter(LogLevel::Trace);
        assert!(targets.would_enable("serialport", &Level::WARN));
        assert!(!targets.would_enable("serialport", &Level::INFO));
    }

    #[test]
    fn quieter_levels_apply_everywhere() {
        let targets = filter(LogLevel::Error);
        assert!(!targets.would_enable("serialport", &Level::WARN));
        assert!(!targets.would_enable("cuelights_link", &Level::WARN));
        assert!(targets.would_enable("cuelights_link", &Level::ERROR));
    }
}
