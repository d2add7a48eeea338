use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Environment variable that overrides every other log level source
pub const LOG_ENV: &str = "PLINTH_LOG";

/// `PLINTH_LOG` wins, then `--log-level`, then the config `logLevel`
pub fn build_env_filter(flag: Option<&str>, config_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = flag.unwrap_or(config_level);
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    })
}

/// Install the global subscriber. Logs go to stderr so JSON output stays clean.
pub fn init_logging(flag: Option<&str>, config_level: &str) {
    let filter = build_env_filter(flag, config_level);

    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
