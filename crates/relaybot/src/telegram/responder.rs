//! Responder that talks to the Telegram Bot API

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use teloxide::prelude::*;
use teloxide::types::CallbackQueryId;

use relaycore::routing::{HandlerResult, Responder};

/// Sends replies into one chat and answers at most one callback query.
///
/// Telegram only accepts the first answer to a callback query, so later
/// answers are dropped.
pub struct TelegramResponder {
    bot: Bot,
    chat_id: ChatId,
    callback_id: Option<CallbackQueryId>,
    answered: AtomicBool,
}

impl TelegramResponder {
    /// Responder for a button press.
    pub fn for_callback(bot: Bot, chat_id: ChatId, callback_id: CallbackQueryId) -> Self {
        Self {
            bot,
            chat_id,
            callback_id: Some(callback_id),
            answered: AtomicBool::new(false),
        }
    }

    /// Responder for a plain message; answering is a no-op.
    pub fn for_chat(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            callback_id: None,
            answered: AtomicBool::new(false),
        }
    }

    pub fn was_answered(&self) -> bool {
        self.answered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn reply(&self, text: &str) -> HandlerResult {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn answer(&self, text: Option<&str>) -> HandlerResult {
        let Some(callback_id) = &self.callback_id else {
            return Ok(());
        };
        if self.answered.swap(true, Ordering::SeqCst) {
            log::debug!("Callback {:?} already answered", callback_id);
            return Ok(());
        }

        let mut request = self.bot.answer_callback_query(callback_id.clone());
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}
