use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "iq-chat")]
#[command(version, about = "Terminal chat client for the IQ Agent backend")]
pub struct Cli {
    /// Base URL of the chat backend (overrides the saved config)
    #[arg(long, global = true, env = "IQ_CHAT_API_URL")]
    pub api_url: Option<String>,

    /// Continue an existing backend conversation
    #[arg(long, global = true)]
    pub conversation_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message and print the reply
    Ask {
        /// Your message
        message: String,
    },
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved backend URL and config file location
    Show,
    /// Save the backend URL used when no flag or env var is given
    SetUrl {
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_launches_tui() {
        let cli = Cli::try_parse_from(["iq-chat"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_ask_with_conversation() {
        let cli = Cli::try_parse_from([
            "iq-chat",
            "ask",
            "what changed?",
            "--conversation-id",
            "thread_1",
            "--api-url",
            "http://agent:8000",
        ])
        .unwrap();

        assert_eq!(cli.conversation_id.as_deref(), Some("thread_1"));
        assert_eq!(cli.api_url.as_deref(), Some("http://agent:8000"));
        match cli.command {
            Some(Command::Ask { message }) => assert_eq!(message, "what changed?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_set_url() {
        let cli = Cli::try_parse_from(["iq-chat", "config", "set-url", "http://x"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config { action: ConfigAction::SetUrl { ref url } }) if url == "http://x"
        ));
    }
}
