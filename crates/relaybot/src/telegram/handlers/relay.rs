//! Channel posts from task sources, relayed into the task's targets

use std::time::Duration;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, MessageId, ParseMode};
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use relaycore::forwarding::{plan_forward, ForwardDecision, IncomingMessage};
use relaycore::settings::ForwardMode;
use relaycore::storage::ChannelKind;

pub(super) fn channel_post_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_channel_post().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move { relay_post(bot, msg, &deps).await }
    })
}

/// Plans the post against every active task that has its chat as a source
/// and schedules the relay of those that pass.
async fn relay_post(bot: Bot, msg: Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let tasks = deps.controller.tasks().tasks_for_source(msg.chat.id.0).await?;
    if tasks.is_empty() {
        return Ok(());
    }

    let text = msg.text().or_else(|| msg.caption()).map(str::to_string);
    for task in tasks {
        let settings = deps.settings.get_task(task.id).await;
        let incoming = IncomingMessage {
            text: text.as_deref(),
            // Anything but plain text counts as media
            has_media: msg.text().is_none(),
            is_forwarded: msg.forward_origin().is_some(),
            is_duplicate: text
                .as_deref()
                .is_some_and(|t| deps.recent.check_and_record(task.id, t)),
        };

        let (mode, delay) = match plan_forward(&settings, &incoming) {
            ForwardDecision::Relay { mode, delay } => (mode, delay),
            ForwardDecision::Skip(reason) => {
                log::debug!("Task #{} skips post {} from {}: {:?}", task.id, msg.id.0, msg.chat.id, reason);
                continue;
            }
        };

        let targets: Vec<ChatId> = deps
            .controller
            .tasks()
            .channels(ChannelKind::Target, task.id)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| ChatId(c.chat_id))
            .collect();
        if targets.is_empty() {
            log::debug!("Task #{} has no targets", task.id);
            continue;
        }

        let relay = Relay {
            bot: bot.clone(),
            task_id: task.id,
            from: msg.chat.id,
            message_id: msg.id,
            text: text.clone(),
            mode,
        };
        tokio::spawn(relay.run(delay, targets));
    }
    Ok(())
}

struct Relay {
    bot: Bot,
    task_id: i64,
    from: ChatId,
    message_id: MessageId,
    text: Option<String>,
    mode: ForwardMode,
}

impl Relay {
    async fn run(self, delay: Duration, targets: Vec<ChatId>) {
        tokio::time::sleep(delay).await;
        for target in targets {
            match self.send(target).await {
                Ok(()) => log::info!(
                    "Task #{} relayed post {} from {} to {} ({})",
                    self.task_id,
                    self.message_id.0,
                    self.from,
                    target,
                    self.mode
                ),
                Err(e) => log::error!("Task #{} failed to relay post to {}: {}", self.task_id, target, e),
            }
        }
    }

    async fn send(&self, target: ChatId) -> Result<(), teloxide::RequestError> {
        match (self.mode, self.text.as_deref()) {
            (ForwardMode::Forward, _) => {
                self.bot.forward_message(target, self.from, self.message_id).await?;
            }
            (ForwardMode::Quote, Some(text)) if !text.is_empty() => {
                let quoted = format!("<blockquote>{}</blockquote>", html::escape(text));
                self.bot.send_message(target, quoted).parse_mode(ParseMode::Html).await?;
            }
            (ForwardMode::Copy | ForwardMode::Quote, _) => {
                self.bot.copy_message(target, self.from, self.message_id).await?;
            }
        }
        Ok(())
    }
}
