//! Logging for the CLI using tracing.
//!
//! Everything goes to stderr so stdout stays clean JSON. The level can be
//! controlled via the `RUST_LOG` env var; `--verbose` raises the default.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(verbose: bool) {
    let default = if verbose {
        "pomodoro_cli=debug,pomodoro_core=debug"
    } else {
        "pomodoro_cli=warn,pomodoro_core=warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
