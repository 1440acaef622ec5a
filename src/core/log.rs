use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const VERBOSE_DIRECTIVE: &str = "marketquote=debug";

/// Directives from `RUST_LOG`, plus crate debug output when `verbose`.
/// Everything is off when neither is given.
pub fn log_directives(rust_log: Option<&str>, verbose: bool) -> String {
    let mut directives: Vec<&str> = rust_log
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .into_iter()
        .collect();
    if verbose {
        directives.push(VERBOSE_DIRECTIVE);
    }
    if directives.is_empty() {
        "off".to_string()
    } else {
        directives.join(",")
    }
}

/// Logs are written to stderr; stdout carries quote data.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = EnvFilter::new(log_directives(rust_log.as_deref(), verbose));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directives() {
        assert_eq!(log_directives(None, false), "off");
        assert_eq!(log_directives(Some("  "), false), "off");
        assert_eq!(log_directives(None, true), "marketquote=debug");
        assert_eq!(log_directives(Some("info"), false), "info");
        assert_eq!(
            log_directives(Some("reqwest=trace"), true),
            "reqwest=trace,marketquote=debug"
        );
    }
}
