//! Command-line surface: global flags, subcommands and the one-shot
//! command runners. Running with no subcommand starts the TUI.

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;
use url::Url;

use crate::items::{Item, ItemDraft, ItemFilter, StatusFilter};
use crate::net::Request;
use crate::services::Services;
use crate::sync::LoadOutcome;

#[derive(Parser, Debug)]
#[command(name = "offsync")]
#[command(about = "An offline-capable item client with a local store and response cache")]
#[command(version)]
pub struct Cli {
  /// Path to config file (default: ./offsync.yaml, then $XDG_CONFIG_HOME/offsync/config.yaml)
  #[arg(short, long, global = true)]
  pub config: Option<PathBuf>,

  /// Start offline: skip the network and serve saved data
  #[arg(long, global = true)]
  pub offline: bool,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Load the collection and print it
  List {
    /// Only items whose title contains this text (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    status: StatusFilter,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
  },

  /// Create an item locally and submit it in the background
  Add {
    title: String,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(long)]
    completed: bool,
  },

  /// Delete cached responses and the stored collection
  Clear,

  /// Show connectivity, store and cache status
  Status,

  /// Precache the static assets and activate the proxy
  Install,

  /// Fetch a URL through the caching proxy and print the body
  Fetch { url: String },
}

/// Run a one-shot subcommand against a built service stack.
pub async fn run(command: Command, services: &Services) -> Result<()> {
  let mut out = std::io::stdout().lock();
  match command {
    Command::List {
      search,
      status,
      json,
    } => {
      let outcome = services.engine.load().await;
      report_outcome(outcome);

      let filter = ItemFilter {
        search: search.unwrap_or_default(),
        status,
      };
      let items = services.engine.items();
      let visible = filter.apply(&items);
      if json {
        serde_json::to_writer_pretty(&mut out, &visible)?;
        writeln!(out)?;
      } else {
        write_table(&mut out, &visible)?;
      }
    }

    Command::Add {
      title,
      description,
      completed,
    } => {
      // The whole collection is persisted after the submit, so start from
      // what is saved rather than an empty list
      services.engine.hydrate().await;
      let draft = ItemDraft {
        title,
        description,
        completed,
      };
      let item = services.engine.add_item(draft)?;
      services.engine.flush().await;
      writeln!(out, "Created #{} {}", item.id, item.title)?;
    }

    Command::Clear => {
      services.engine.clear().await;
      writeln!(out, "Cleared cached responses and stored items")?;
    }

    Command::Status => {
      services.engine.hydrate().await;
      writeln!(out, "{}", services.engine.status())?;
    }

    Command::Install => {
      let count = services.proxy.install().await?;
      services.proxy.activate()?;
      writeln!(out, "Precached {} assets", count)?;
    }

    Command::Fetch { url } => {
      let url = Url::parse(&url).map_err(|e| eyre!("Invalid URL '{}': {}", url, e))?;
      let response = services.proxy.handle(Request::get(url)).await?;
      tracing::info!(status = response.status, url = %response.url, "fetched");
      out.write_all(&response.body)?;
      if !response.body.ends_with(b"\n") {
        writeln!(out)?;
      }
    }
  }
  Ok(())
}

fn report_outcome(outcome: LoadOutcome) {
  match outcome {
    LoadOutcome::Success => {}
    LoadOutcome::FallbackLoaded => eprintln!("network unavailable, showing saved items"),
    LoadOutcome::Failed => eprintln!("network unavailable and nothing saved yet"),
  }
}

fn write_table(out: &mut impl Write, items: &[&Item]) -> std::io::Result<()> {
  for item in items {
    let mark = if item.completed { "x" } else { " " };
    writeln!(out, "[{}] {:>14}  {}", mark, item.id, item.title)?;
  }
  Ok(())
}
