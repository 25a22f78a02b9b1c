use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the stderr logger. `-v` enables debug output and `-vv` trace;
/// `RUST_LOG`, when set, takes precedence.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter))
        .try_init();
}
