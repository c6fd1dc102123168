use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(author, version, about = "Telegram bot that relays messages between chats per task", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling
    Run,

    /// Print the callback routes the bot registers
    Routes,

    /// Print stored system settings
    Settings {
        /// Only settings marked public
        #[arg(long)]
        public_only: bool,

        /// Print as JSON instead of one line per setting
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["relaybot", "settings", "--public-only"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Settings {
                public_only: true,
                json: false
            })
        );

        let cli = Cli::try_parse_from(["relaybot"]).unwrap();
        assert_eq!(cli.command, None);
    }
}
