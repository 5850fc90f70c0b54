//! Progress messages on standard error.
//!
//! Verbosity starts at 1; each `-v` raises it and each `-q` lowers it.
//! `RUST_LOG` is applied on top and wins where it is set.

use log::{Level, LevelFilter};
use std::io::Write;

/// Map a verbosity to the most detailed level that gets printed.
pub fn level_for(verbosity: i32) -> LevelFilter {
    match verbosity {
        i32::MIN..=0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger for the process.
pub fn init(verbosity: i32) {
    let level = level_for(verbosity);

    let _ = env_logger::Builder::new()
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        })
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
