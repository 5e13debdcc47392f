//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from `RUST_LOG` when set, otherwise from the `-v` count
//! (0 = info, 1 = debug, 2+ = trace). While the TUI owns the terminal the
//! records go to a log file instead of stderr.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

pub enum LogSink<'a> {
    Stderr,
    File(&'a Path),
}

pub fn init_logging(verbose: u8, sink: LogSink<'_>) -> Result<()> {
    let mut builder = Builder::new();

    let use_env = env::var("RUST_LOG").is_ok();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose));
    }

    match sink {
        LogSink::Stderr => {
            builder.target(Target::Stderr);
        }
        LogSink::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log dir: {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
            builder.write_style(WriteStyle::Never);
        }
    }

    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                timestamp,
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{} {:<5} {}", timestamp, record.level(), record.args())
        }
    });

    builder.try_init().context("logger already initialized")?;
    log::debug!("logging initialized at level {:?}", log::max_level());
    Ok(())
}

fn determine_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_level() {
        assert_eq!(determine_level(0), LevelFilter::Info);
        assert_eq!(determine_level(1), LevelFilter::Debug);
        assert_eq!(determine_level(2), LevelFilter::Trace);
        assert_eq!(determine_level(7), LevelFilter::Trace);
    }
}
