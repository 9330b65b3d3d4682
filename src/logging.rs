//! Tracing subscriber setup.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
pub enum LogTarget {
  /// One-shot commands log to stderr
  Stderr,
  /// The TUI owns the terminal, so logs go to a file in the data directory
  File,
}

/// Honor RUST_LOG if set, otherwise use the verbosity flag.
fn filter(verbose: u8) -> EnvFilter {
  if std::env::var("RUST_LOG").is_ok() {
    EnvFilter::from_default_env()
  } else {
    match verbose {
      0 => EnvFilter::new("warn"),
      1 => EnvFilter::new("info"),
      2 => EnvFilter::new("debug,rusqlite=info"),
      _ => EnvFilter::new("trace"),
    }
  }
}

/// Install the global subscriber. Keep the returned guard alive for the life
/// of the process so buffered file output is flushed on exit.
pub fn init(target: LogTarget, verbose: u8) -> Result<Option<WorkerGuard>> {
  match target {
    LogTarget::Stderr => {
      tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .map_err(|e| eyre!("Failed to install logger: {}", e))?;
      Ok(None)
    }
    LogTarget::File => {
      let dir = crate::db::data_dir()?;
      std::fs::create_dir_all(&dir)
        .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

      let appender = tracing_appender::rolling::never(&dir, "offsync.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);

      // Default to info in the TUI; the file is only read after the fact
      tracing_subscriber::fmt()
        .with_env_filter(filter(verbose.max(1)))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install logger: {}", e))?;
      Ok(Some(guard))
    }
  }
}
