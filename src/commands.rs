//! `:` commands understood by the TUI, and their autocomplete ranking.

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "refresh",
    aliases: &["r", "reload", "load"],
    description: "Fetch items, falling back to local data",
  },
  Command {
    name: "add",
    aliases: &["a", "new"],
    description: "Create an item locally",
  },
  Command {
    name: "filter",
    aliases: &["f", "status"],
    description: "Cycle all / completed / pending",
  },
  Command {
    name: "online",
    aliases: &["on", "connect"],
    description: "Mark the network as reachable",
  },
  Command {
    name: "offline",
    aliases: &["off", "disconnect"],
    description: "Simulate losing the network",
  },
  Command {
    name: "clear",
    aliases: &["wipe", "purge"],
    description: "Delete cached responses and stored items",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit offsync",
  },
];

impl Command {
  /// How well `input` (already lowercased) names this command, lower is
  /// better. `None` means no match at all.
  fn rank(&self, input: &str) -> Option<u8> {
    let names = || std::iter::once(self.name).chain(self.aliases.iter().copied());
    if self.name == input {
      Some(0)
    } else if self.aliases.contains(&input) {
      Some(1)
    } else if self.name.starts_with(input) {
      Some(2)
    } else if names().any(|n| n.starts_with(input)) {
      Some(3)
    } else if names().any(|n| n.contains(input)) {
      Some(4)
    } else {
      None
    }
  }
}

/// Commands matching `input`, best match first. Empty input lists them all
/// in declaration order.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  let mut ranked: Vec<(u8, &'static Command)> = COMMANDS
    .iter()
    .filter_map(|cmd| cmd.rank(&input).map(|rank| (rank, cmd)))
    .collect();
  // Stable, so ties keep declaration order
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("clear");
    assert_eq!(suggestions[0].name, "clear");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "off" is an alias of offline and also a prefix of it
    let suggestions = get_suggestions("off");
    assert_eq!(suggestions[0].name, "offline");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("ref");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_online_and_offline_are_distinct() {
    assert_eq!(get_suggestions("on")[0].name, "online");
    assert_eq!(get_suggestions("offline")[0].name, "offline");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
