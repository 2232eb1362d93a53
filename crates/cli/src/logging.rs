use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Logs go to stderr so decoded lines on stdout stay clean.
pub fn setup_logging(json: bool) {
    let dirs = "info,ptpack=debug";
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(dirs));

    if json {
        let main_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .with_current_span(true)
            .with_span_list(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(main_layer)
            .init()
    } else {
        let main_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(main_layer)
            .init()
    }
}
