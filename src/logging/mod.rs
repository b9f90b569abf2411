//! Operator log setup.
//!
//! Log lines go to stdout through `tracing-subscriber`. The configured
//! verbosity (0-4) picks the most detailed level that is let through; 0
//! turns logging off entirely.

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The subscriber `init` installs, writing to `writer` instead of stdout.
pub fn subscriber<W>(verbosity: u8, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_max_level(level_filter(verbosity))
        .with_writer(writer)
        .with_target(verbosity >= 3)
        .finish()
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(verbosity: u8) {
    let _ = tracing::subscriber::set_global_default(subscriber(verbosity, std::io::stdout));
}
