use arbor_core::Role;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keep every version of a conversation: edits and regenerations branch
/// instead of overwriting.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Directory holding conversation files (defaults to the user data directory)
    #[arg(long, env = "ARBOR_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    #[command(flatten)]
    Conversation(ConversationCommands),
    /// Manage user preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesCommands,
    },
}

/// Conversation and node arguments accept any unique prefix of an id.
#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum ConversationCommands {
    /// Start an empty conversation
    New {
        #[arg(long)]
        title: Option<String>,
    },
    /// List stored conversations, most recent first
    List,
    /// Print the visible path of a conversation
    Show {
        conversation: String,
        /// Print every node, not just the active branches
        #[arg(long)]
        tree: bool,
    },
    /// Append a message after the last visible one
    Say {
        conversation: String,
        text: String,
        #[arg(long, default_value_t = Role::User)]
        role: Role,
        /// Model recorded on assistant messages (defaults to preferences)
        #[arg(long)]
        model: Option<String>,
    },
    /// Edit a message, branching or in place per preferences
    Edit {
        conversation: String,
        node: String,
        text: String,
    },
    /// Add an alternative assistant reply
    Regenerate {
        conversation: String,
        node: String,
        #[arg(long)]
        model: Option<String>,
        /// Content of the new reply
        #[arg(long)]
        content: Option<String>,
    },
    /// Select the child at a 1-based position
    Switch {
        conversation: String,
        /// Branch point; top-level messages when omitted
        #[arg(long)]
        node: Option<String>,
        position: usize,
    },
    /// Show the next alternative of a message
    Next { conversation: String, node: String },
    /// Show the previous alternative of a message
    Prev { conversation: String, node: String },
    /// Delete a message and everything below it
    Delete { conversation: String, node: String },
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum PreferencesCommands {
    /// Show current preferences
    Show,
    /// Print the preferences file location
    Path,
    /// Reset preferences to defaults
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_say_with_role() {
        let cli = Cli::try_parse_from([
            "arbor", "say", "0193", "hello", "--role", "assistant", "--model", "m1",
        ])
        .unwrap();
        assert_eq!(
            cli.command_conversation(),
            Some(&ConversationCommands::Say {
                conversation: "0193".to_string(),
                text: "hello".to_string(),
                role: Role::Assistant,
                model: Some("m1".to_string()),
            })
        );
    }

    #[test]
    fn say_defaults_to_user() {
        let cli = Cli::try_parse_from(["arbor", "say", "c", "hi"]).unwrap();
        assert!(matches!(
            cli.command_conversation(),
            Some(ConversationCommands::Say {
                role: Role::User,
                ..
            })
        ));
    }

    #[test]
    fn parses_switch_on_a_node() {
        let cli = Cli::try_parse_from(["arbor", "switch", "c", "--node", "user_1", "2"]).unwrap();
        assert_eq!(
            cli.command_conversation(),
            Some(&ConversationCommands::Switch {
                conversation: "c".to_string(),
                node: Some("user_1".to_string()),
                position: 2,
            })
        );
    }

    #[test]
    fn parses_preferences_and_data_dir() {
        let cli =
            Cli::try_parse_from(["arbor", "preferences", "path", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Commands::Preferences {
                action: PreferencesCommands::Path
            }
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from(["arbor", "say", "c", "hi", "--role", "robot"]).is_err());
    }

    impl Cli {
        fn command_conversation(&self) -> Option<&ConversationCommands> {
            match &self.command {
                Commands::Conversation(command) => Some(command),
                Commands::Preferences { .. } => None,
            }
        }
    }
}
