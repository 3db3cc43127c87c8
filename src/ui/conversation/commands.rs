use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a chat message with a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SlashCommand {
    /// Ask the server to ingest a web page
    Fetch,
    /// Upload a file to the server
    Upload,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Fetch => "fetch a web page so you can ask about it",
            SlashCommand::Upload => "upload a file so you can ask about it",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Usage hint for commands that take an argument.
    pub fn usage(self) -> Option<&'static str> {
        match self {
            SlashCommand::Fetch => Some("<url>"),
            SlashCommand::Upload => Some("<path>"),
            SlashCommand::Help | SlashCommand::Quit => None,
        }
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim_start().strip_prefix('/')?;

    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body.trim_end(), ""),
    };

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "h" | "?" => Some(SlashCommand::Help),
        "url" | "f" => Some(SlashCommand::Fetch),
        "u" | "file" => Some(SlashCommand::Upload),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands and keys
pub fn get_help_text() -> String {
    let mut help = String::from("Commands:\n");
    for entry in command_entries() {
        let usage = entry.command.usage().map(|u| format!(" {u}")).unwrap_or_default();
        help.push_str(&format!("  /{}{} - {}\n", entry.keyword, usage, entry.description));
    }

    help.push_str("\nKeys:\n");
    help.push_str("  Enter - submit the focused field\n");
    help.push_str("  Shift+Enter - new line in the chat field\n");
    help.push_str("  Tab / Shift+Tab - move between chat, URL and upload fields\n");
    help.push_str("  PageUp / PageDown - scroll the conversation\n");
    help.push_str("  Esc - close this panel\n");
    help.push_str("  Ctrl+C - quit");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_argument() {
        let parsed = parse_slash_command("/fetch  https://example.com ").unwrap();
        assert_eq!(parsed.command, SlashCommand::Fetch);
        assert_eq!(parsed.argument(), Some("https://example.com"));
    }

    #[test]
    fn keeps_spaces_inside_the_argument() {
        let parsed = parse_slash_command("/upload /tmp/my notes.txt").unwrap();
        assert_eq!(parsed.command, SlashCommand::Upload);
        assert_eq!(parsed.argument(), Some("/tmp/my notes.txt"));
    }

    #[test]
    fn resolves_aliases() {
        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Quit);
        assert_eq!(parse_slash_command("/url x").unwrap().command, SlashCommand::Fetch);
        assert_eq!(parse_slash_command("/help").unwrap().argument, None);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert!(parse_slash_command("hello /fetch").is_none());
        assert!(parse_slash_command("/frobnicate").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
