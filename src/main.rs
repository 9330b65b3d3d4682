mod app;
mod cache;
mod cli;
mod commands;
mod config;
mod connectivity;
mod db;
mod error;
mod event;
mod items;
mod logging;
mod net;
mod proxy;
mod services;
mod store;
mod sync;
mod ui;

use clap::Parser;
use color_eyre::Result;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, LeaveAlternateScreen};
use std::io;
use std::panic;

use cli::Cli;
use logging::LogTarget;
use services::Services;

/// Restore the terminal before the panic message is printed.
fn setup_panic_hook() {
  let original_hook = panic::take_hook();
  panic::set_hook(Box::new(move |panic_info| {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    original_hook(panic_info);
  }));
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Cli::parse();

  // The TUI owns the terminal, so its logs go to a file
  let target = if args.command.is_some() {
    LogTarget::Stderr
  } else {
    LogTarget::File
  };
  let _log_guard = logging::init(target, args.verbose)?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let services = Services::build(&config, args.offline)?;

  let result = match args.command {
    Some(command) => cli::run(command, &services).await,
    None => {
      setup_panic_hook();
      let mut app = app::App::new(services.engine.clone(), config.api.url.clone());
      app.run(config.revalidate_interval()).await
    }
  };

  services.shutdown().await;
  result
}
