//! Owner text commands
//!
//! - `!ban-sync link #<name>:<server>`
//! - `!ban-sync unlink`

use crate::types::RoomAlias;

const LINK_PREFIX: &str = "!ban-sync link ";
const UNLINK_COMMAND: &str = "!ban-sync unlink";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Link the current room to the room behind `alias`
    Link { alias: RoomAlias },
    /// Remove the current room from its link group
    Unlink,
}

impl BotCommand {
    /// Parse a message body. Anything that is not a well-formed command,
    /// including a link command without a usable alias, yields `None`.
    pub fn parse(body: &str) -> Option<Self> {
        let body = body.trim();

        if let Some(rest) = body.strip_prefix(LINK_PREFIX) {
            return RoomAlias::parse(rest.trim()).map(|alias| BotCommand::Link { alias });
        }

        let rest = body.strip_prefix(UNLINK_COMMAND)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(BotCommand::Unlink);
        }
        None
    }

    /// Short label, used for metric labels
    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Link { .. } => "link",
            BotCommand::Unlink => "unlink",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link() {
        assert_eq!(
            BotCommand::parse("  !ban-sync link #mods:example.org \n"),
            Some(BotCommand::Link {
                alias: RoomAlias::new("mods", "example.org"),
            })
        );
    }

    #[test]
    fn test_parse_link_with_port_in_server() {
        let command = BotCommand::parse("!ban-sync link #mods:example.org:8448").unwrap();
        assert_eq!(
            command,
            BotCommand::Link {
                alias: RoomAlias::new("mods:example.org", "8448"),
            }
        );
    }

    #[test]
    fn test_parse_link_without_alias_is_ignored() {
        assert_eq!(BotCommand::parse("!ban-sync link mods"), None);
        assert_eq!(BotCommand::parse("!ban-sync link #mods"), None);
        assert_eq!(BotCommand::parse("!ban-sync link"), None);
    }

    #[test]
    fn test_parse_unlink() {
        assert_eq!(BotCommand::parse("!ban-sync unlink"), Some(BotCommand::Unlink));
        assert_eq!(
            BotCommand::parse("!ban-sync unlink please"),
            Some(BotCommand::Unlink)
        );
        assert_eq!(BotCommand::parse("!ban-sync unlinked"), None);
    }

    #[test]
    fn test_parse_other_text() {
        assert_eq!(BotCommand::parse("hello"), None);
        assert_eq!(BotCommand::parse("!ban-sync"), None);
        assert_eq!(BotCommand::parse("!ban-sync status"), None);
    }
}
