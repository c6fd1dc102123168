//! Dispatcher schema and handler chain builders

use std::sync::Arc;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::relay::channel_post_handler;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::{main_menu, Command};
use crate::telegram::responder::TelegramResponder;
use relaycore::config::admin;
use relaycore::routing::{CallbackEvent, Responder};

const NOT_ALLOWED: &str = "⛔ You are not allowed to manage tasks";
const UNKNOWN_ACTION: &str = "⚠️ Unknown or expired button";

/// Creates the dispatcher schema: commands, then free text, then callback
/// queries, then channel posts.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps.clone();
    let deps_posts = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
        .branch(channel_post_handler(deps_posts))
}

fn sender_id(user: Option<&teloxide::types::User>) -> i64 {
    user.and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move { handle_command(bot, msg, cmd, &deps).await }
        },
    ))
}

/// Shortcut commands go through the same dispatcher as the buttons.
async fn handle_command(bot: Bot, msg: Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user_id = sender_id(msg.from.as_ref());
    log::info!("Received command {:?} from user {} in chat {}", cmd, user_id, msg.chat.id);

    if !admin::is_admin(user_id) {
        bot.send_message(msg.chat.id, NOT_ALLOWED).await?;
        return Ok(());
    }

    match cmd.route() {
        Some(route) => {
            let responder = Arc::new(TelegramResponder::for_chat(bot.clone(), msg.chat.id));
            let ctx = deps.session(msg.chat.id.0, user_id, responder);
            let event = CallbackEvent::new(route, msg.chat.id.0, user_id);
            let handled = deps.dispatcher.dispatch(event, ctx).await;
            deps.release(msg.chat.id.0);
            if !handled {
                bot.send_message(msg.chat.id, "❌ Something went wrong, try again later")
                    .await?;
            }
        }
        None if cmd == Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "🤖 Relaygram: choose an action")
                .reply_markup(main_menu())
                .await?;
        }
    }
    Ok(())
}

/// Free text answers a pending prompt (task name, keyword, replacement).
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user_id = sender_id(msg.from.as_ref());
                if !admin::is_admin(user_id) {
                    return Ok(());
                }
                let text = msg.text().unwrap_or_default();
                let responder = Arc::new(TelegramResponder::for_chat(bot, msg.chat.id));
                let ctx = deps.session(msg.chat.id.0, user_id, responder);

                if !deps.controller.handle_text(&ctx, text).await {
                    log::debug!("Ignoring text in chat {}: no prompt pending", msg.chat.id);
                }
                drop(ctx);
                deps.release(msg.chat.id.0);
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(bot, q, &deps).await }
    })
}

/// Routes a button press through the dispatcher and makes sure the query is
/// answered exactly once.
async fn handle_callback(bot: Bot, q: CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user_id = sender_id(Some(&q.from));
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        log::warn!("Callback {:?} from user {} has no message, ignoring", q.data, user_id);
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let responder = Arc::new(TelegramResponder::for_callback(bot, chat_id, q.id.clone()));
    if !admin::is_admin(user_id) {
        log::warn!("User {} is not allowed to press {:?}", user_id, q.data);
        responder.answer(Some(NOT_ALLOWED)).await?;
        return Ok(());
    }

    let mut event = CallbackEvent::new(q.data.unwrap_or_default(), chat_id.0, user_id);
    event.message_id = q.message.as_ref().map(|m| m.id().0);

    let ctx = deps.session(chat_id.0, user_id, responder.clone());
    let handled = deps.dispatcher.dispatch(event, ctx).await;
    deps.release(chat_id.0);

    if !responder.was_answered() {
        let text = if handled { None } else { Some(UNKNOWN_ACTION) };
        responder.answer(text).await?;
    }
    Ok(())
}
