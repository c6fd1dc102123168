//! Bot instance creation and the command menu

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

use relaycore::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "list forwarding tasks")]
    Tasks,
    #[command(description = "list settings presets")]
    Presets,
    #[command(description = "task statistics")]
    Stats,
    #[command(description = "show this help")]
    Help,
}

impl Command {
    /// Callback identifier the command is a shortcut for, if any.
    pub fn route(&self) -> Option<&'static str> {
        match self {
            Command::Tasks => Some("task_list"),
            Command::Presets => Some("preset_list"),
            Command::Stats => Some("task_stats"),
            Command::Start | Command::Help => None,
        }
    }
}

/// Creates a Bot instance from `BOT_TOKEN` (or `TELOXIDE_TOKEN`)
///
/// # Returns
/// * `Ok(Bot)` - Bot ready to be dispatched
/// * `Err(anyhow::Error)` - No token configured
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    Ok(Bot::new(token))
}

/// Registers the commands in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Inline keyboard of the main menu; each button carries a registered callback id.
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📋 Tasks", "task_list"),
            InlineKeyboardButton::callback("➕ Create task", "task_create"),
        ],
        vec![
            InlineKeyboardButton::callback("📊 Stats", "task_stats"),
            InlineKeyboardButton::callback("📦 Presets", "preset_list"),
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_command_routes() {
        assert_eq!(Command::Tasks.route(), Some("task_list"));
        assert_eq!(Command::Start.route(), None);
    }

    #[test]
    fn test_main_menu_buttons_carry_callback_data() {
        let ids: Vec<String> = main_menu()
            .inline_keyboard
            .into_iter()
            .flatten()
            .filter_map(|button| match button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["task_list", "task_create", "task_stats", "preset_list"]);
    }
}
