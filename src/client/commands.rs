/// Seed used by `.generate` when none (or garbage) is given
pub const DEFAULT_PREVIEW_SEED: u32 = 1000;

/// Dot-commands accepted from the admin in chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Generate and send a whole world without starting a round
    Generate { seed: u32 },
    /// Cover the whole map in fog
    Hide,
    /// Reveal the whole map
    ShowAll,
    /// Reveal the area around every treasure
    ShowTreasure,
    Start,
    Stop,
    /// Flood-discover from the admin's position
    Discover,
    /// Send both layers of the current map again
    Resend,
    /// Flip the dig-permission flag
    ToggleDig,
}

impl AdminCommand {
    /// Parse a chat line. Anything not starting with a known command is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let command = words.next()?.strip_prefix('.')?;
        let arg = words.next();

        let parsed = match command {
            "generate" => AdminCommand::Generate {
                seed: arg.and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_PREVIEW_SEED),
            },
            "hide" => AdminCommand::Hide,
            "show" if arg == Some("treasure") => AdminCommand::ShowTreasure,
            "show" => AdminCommand::ShowAll,
            "start" => AdminCommand::Start,
            "stop" => AdminCommand::Stop,
            "discover" => AdminCommand::Discover,
            "resend" => AdminCommand::Resend,
            "allow" => AdminCommand::ToggleDig,
            _ => return None,
        };
        Some(parsed)
    }

    /// Direct-message acknowledgement sent to the admin, if any
    pub fn acknowledgement(&self) -> Option<&'static str> {
        match self {
            AdminCommand::Hide => Some("Hiding all tiles."),
            AdminCommand::ShowAll => Some("Showing all tiles."),
            AdminCommand::ShowTreasure => Some("Showing treasure."),
            AdminCommand::Start => Some("Starting game loop."),
            AdminCommand::Stop => Some("Stopping game loop."),
            AdminCommand::Discover => Some("Discovering tile."),
            AdminCommand::Generate { .. } => Some("Generating world."),
            AdminCommand::Resend | AdminCommand::ToggleDig => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(AdminCommand::parse(".start"), Some(AdminCommand::Start));
        assert_eq!(AdminCommand::parse(".stop now"), Some(AdminCommand::Stop));
        assert_eq!(AdminCommand::parse(".hide"), Some(AdminCommand::Hide));
        assert_eq!(AdminCommand::parse(".show"), Some(AdminCommand::ShowAll));
        assert_eq!(AdminCommand::parse(".show treasure"), Some(AdminCommand::ShowTreasure));
        assert_eq!(AdminCommand::parse(".allow"), Some(AdminCommand::ToggleDig));
        assert_eq!(AdminCommand::parse(".resend"), Some(AdminCommand::Resend));
        assert_eq!(AdminCommand::parse(".discover"), Some(AdminCommand::Discover));
    }

    #[test]
    fn test_parse_generate_seed() {
        assert_eq!(AdminCommand::parse(".generate 42"), Some(AdminCommand::Generate { seed: 42 }));
        assert_eq!(
            AdminCommand::parse(".generate"),
            Some(AdminCommand::Generate { seed: DEFAULT_PREVIEW_SEED })
        );
        assert_eq!(
            AdminCommand::parse(".generate lots"),
            Some(AdminCommand::Generate { seed: DEFAULT_PREVIEW_SEED })
        );
    }

    #[test]
    fn test_parse_rejects_chatter() {
        assert_eq!(AdminCommand::parse("hello"), None);
        assert_eq!(AdminCommand::parse(""), None);
        assert_eq!(AdminCommand::parse(".dance"), None);
        assert_eq!(AdminCommand::parse("start"), None);
    }
}
