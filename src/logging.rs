//! Console logging for the `quire` binary.

use std::io::Write;

use colored::Colorize;
use env_logger::{Builder, Env};
use log::Level;

/// Installs the logger. The filter comes from `RUST_LOG` and defaults to
/// `info`, or `warn` when `quiet` is set. Calling this twice is a no-op.
pub fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    let logging_env = Env::default().filter_or("RUST_LOG", default_filter);
    let _ = Builder::from_env(logging_env)
        .format(|buf, record| {
            let target = short_target(record.target());
            let message = match record.level() {
                Level::Error => record.args().to_string().red().to_string(),
                Level::Warn => record.args().to_string().yellow().to_string(),
                _ => record.args().to_string(),
            };
            writeln!(
                buf,
                "{} {} {}",
                chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
                target.to_ascii_lowercase().bold().bright_yellow(),
                message
            )
        })
        .try_init();
}

// `quire::write` -> `write`
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}
