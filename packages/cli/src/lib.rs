// ABOUTME: Library half of the adapt binary
// ABOUTME: Argument parsing, terminal formatting, and tracing setup

pub mod args;
pub mod display;

use tracing_subscriber::EnvFilter;

/// Log to stderr with `RUST_LOG` filtering, `info` by default
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
