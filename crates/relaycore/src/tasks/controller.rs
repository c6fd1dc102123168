//! Task controller: the callback operations behind the task-management menus

use async_trait::async_trait;
use itertools::Itertools;
use std::sync::Arc;

use super::args::{chat_and_title, suffix, task_and_name, trailing_number, two_numbers};
use crate::core::config::routing::TASKS_PER_PAGE;
use crate::routing::{CallbackEvent, CallbackProvider, HandlerError, HandlerResult, PendingInput, SessionContext};
use crate::settings::{ForwardMode, SettingToggle, SettingsStore, TaskSettings};
use crate::storage::{ChannelKind, Task, TaskRepository};

/// Implements every [`CallbackProvider`] operation over the settings store
/// and the task repository, replying through the session's responder.
#[derive(Clone)]
pub struct TaskController {
    settings: Arc<SettingsStore>,
    tasks: TaskRepository,
}

fn malformed(id: &str) -> HandlerError {
    format!("Malformed callback data '{}'", id).into()
}

fn task_arg(event: &CallbackEvent) -> Result<i64, HandlerError> {
    trailing_number(&event.id).ok_or_else(|| malformed(&event.id))
}

fn status(task: &Task) -> &'static str {
    if task.is_active {
        "🟢 Active"
    } else {
        "⏸ Paused"
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "✅"
    } else {
        "❌"
    }
}

impl TaskController {
    pub fn new(settings: Arc<SettingsStore>, tasks: TaskRepository) -> Self {
        Self { settings, tasks }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    /// Persists `settings` and replies `done`, or the reasons it was refused.
    async fn save(&self, ctx: &SessionContext, task_id: i64, settings: &TaskSettings, done: &str) -> HandlerResult {
        if self.settings.update_task(task_id, settings).await {
            return ctx.reply(done).await;
        }
        let report = self.settings.validate(settings);
        if report.is_valid() {
            ctx.reply("❌ Failed to save settings, try again later").await
        } else {
            let reasons = report.errors().iter().map(|e| format!("• {}", e)).join("\n");
            ctx.reply(&format!("❌ Settings not saved:\n{}", reasons)).await
        }
    }

    /// The task if it exists and the chat's user may see it; replies
    /// "not found" otherwise.
    async fn existing_task(&self, ctx: &SessionContext, task_id: i64) -> Result<Option<Task>, HandlerError> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .filter(|task| task.is_visible_to(ctx.user_id));
        if task.is_none() {
            ctx.reply(&format!("❌ Task #{} not found", task_id)).await?;
        }
        Ok(task)
    }

    async fn task_exists(&self, ctx: &SessionContext, task_id: i64) -> Result<bool, HandlerError> {
        Ok(self.existing_task(ctx, task_id).await?.is_some())
    }

    async fn reply_task_page(&self, ctx: &SessionContext, page: usize) -> HandlerResult {
        let page = page.max(1);
        let tasks = self
            .tasks
            .list(ctx.user_id, (page - 1) * TASKS_PER_PAGE, TASKS_PER_PAGE)
            .await?;
        let counts = self.tasks.counts(ctx.user_id).await?;

        if tasks.is_empty() {
            let text = if counts.total == 0 {
                "📋 No tasks yet. Use ➕ Create task to add one.".to_string()
            } else {
                format!("📋 Page {} is empty ({} tasks total)", page, counts.total)
            };
            return ctx.reply(&text).await;
        }

        let lines = tasks
            .iter()
            .map(|t| format!("{} #{} {}", if t.is_active { "🟢" } else { "⏸" }, t.id, t.name))
            .join("\n");
        ctx.reply(&format!("📋 Tasks (page {}, {} total):\n\n{}", page, counts.total, lines))
            .await
    }

    /// Consumes free text the chat was asked for. Returns `false` when
    /// nothing was pending.
    pub async fn handle_text(&self, ctx: &SessionContext, text: &str) -> bool {
        let Some(pending) = ctx.take_pending().await else {
            return false;
        };
        if let Err(e) = self.consume_text(ctx, pending, text.trim()).await {
            log::error!("Failed to handle {:?} input in chat {}: {}", pending, ctx.chat_id, e);
        }
        true
    }

    async fn consume_text(&self, ctx: &SessionContext, pending: PendingInput, text: &str) -> HandlerResult {
        if text.is_empty() {
            ctx.set_pending(pending).await;
            return ctx.reply("⚠️ Empty input, please send some text").await;
        }

        match pending {
            PendingInput::TaskName => {
                let id = self.tasks.create(text, None, Some(ctx.user_id)).await?;
                log::info!("Task #{} '{}' created by user {}", id, text, ctx.user_id);
                ctx.reply(&format!("✅ Task #{} \"{}\" created", id, text)).await
            }
            PendingInput::TaskRename(task_id) => {
                if self.tasks.rename(task_id, text).await? {
                    ctx.reply(&format!("✅ Task #{} renamed to \"{}\"", task_id, text)).await
                } else {
                    ctx.reply(&format!("❌ Task #{} not found", task_id)).await
                }
            }
            PendingInput::Keyword(task_id) => {
                if !self.task_exists(ctx, task_id).await? {
                    return Ok(());
                }
                let mut settings = self.settings.get_task(task_id).await;
                settings.keyword_filters.push(text.to_string());
                self.save(ctx, task_id, &settings, &format!("✅ Keyword \"{}\" added", text))
                    .await
            }
            PendingInput::Replacement(task_id) => {
                let Some((from, to)) = text
                    .split_once("=>")
                    .map(|(f, t)| (f.trim(), t.trim()))
                    .filter(|(from, _)| !from.is_empty())
                else {
                    ctx.set_pending(pending).await;
                    return ctx.reply("⚠️ Use the format: from => to").await;
                };
                if !self.task_exists(ctx, task_id).await? {
                    return Ok(());
                }
                let mut settings = self.settings.get_task(task_id).await;
                settings.replace_text.insert(from.to_string(), to.to_string());
                self.save(ctx, task_id, &settings, &format!("✅ \"{}\" will be replaced with \"{}\"", from, to))
                    .await
            }
            PendingInput::Channel(kind, task_id) => {
                let Some((chat_id, title)) = chat_and_title(text) else {
                    ctx.set_pending(pending).await;
                    return ctx.reply("⚠️ Send a numeric chat id, e.g. -1001234567890").await;
                };
                self.add_channel(ctx, kind, task_id, chat_id, title).await
            }
        }
    }

    async fn add_channel(
        &self,
        ctx: &SessionContext,
        kind: ChannelKind,
        task_id: i64,
        chat_id: i64,
        title: Option<&str>,
    ) -> HandlerResult {
        if !self.task_exists(ctx, task_id).await? {
            return Ok(());
        }
        let other = kind.other();
        if self
            .tasks
            .channels(other, task_id)
            .await?
            .iter()
            .any(|c| c.chat_id == chat_id)
        {
            return ctx
                .reply(&format!("⚠️ Chat {} is already a {} of task #{}", chat_id, other, task_id))
                .await;
        }

        if self.tasks.add_channel(kind, task_id, chat_id, title).await? {
            log::info!("Chat {} added as {} of task #{} by user {}", chat_id, kind, task_id, ctx.user_id);
            ctx.reply(&format!("✅ Chat {} added as a {} of task #{}", chat_id, kind, task_id))
                .await
        } else {
            ctx.reply(&format!("ℹ️ Chat {} is already a {} of task #{}", chat_id, kind, task_id))
                .await
        }
    }
}

#[async_trait]
impl CallbackProvider for TaskController {
    async fn start_task_creation(self: Arc<Self>, _event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        ctx.set_pending(PendingInput::TaskName).await;
        ctx.reply("📝 Send a name for the new task").await
    }

    async fn show_task_list(self: Arc<Self>, _event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        self.reply_task_page(&ctx, 1).await
    }

    async fn refresh_task_list(self: Arc<Self>, _event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        ctx.answer(Some("🔄 Refreshed")).await?;
        self.reply_task_page(&ctx, 1).await
    }

    async fn show_task_stats(self: Arc<Self>, _event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let counts = self.tasks.counts(ctx.user_id).await?;
        ctx.reply(&format!(
            "📊 Tasks: {}\n🟢 Active: {}\n⏸ Paused: {}",
            counts.total,
            counts.active,
            counts.inactive()
        ))
        .await
    }

    async fn show_task_page(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let page = usize::try_from(task_arg(&event)?).map_err(|_| malformed(&event.id))?;
        self.reply_task_page(&ctx, page).await
    }

    async fn show_task(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        let Some(task) = self.existing_task(&ctx, task_id).await? else {
            return Ok(());
        };
        let settings = self.settings.get_task(task_id).await;
        ctx.reply(&format!(
            "📌 Task #{}: {}\n{}\n📤 Mode: {}\n⏱ Delay: {}-{}s",
            task.id,
            task.name,
            status(&task),
            settings.forward_mode.title(),
            settings.delay_min,
            settings.delay_max
        ))
        .await
    }

    async fn show_task_info(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        let Some(task) = self.existing_task(&ctx, task_id).await? else {
            return Ok(());
        };
        let created = task
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let sources = self.tasks.channels(ChannelKind::Source, task_id).await?.len();
        let targets = self.tasks.channels(ChannelKind::Target, task_id).await?.len();
        let summary = self.settings.format_task_settings(task_id).await;
        ctx.reply(&format!(
            "ℹ️ Task #{}: {}\n{}\n📅 Created: {}\n📝 {}\n📡 Sources: {}\n🎯 Targets: {}\n\n{}",
            task.id,
            task.name,
            status(&task),
            created,
            task.description.as_deref().unwrap_or("No description"),
            sources,
            targets,
            summary
        ))
        .await
    }

    async fn show_task_edit(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        let Some(task) = self.existing_task(&ctx, task_id).await? else {
            return Ok(());
        };
        ctx.reply(&format!(
            "✏️ Editing task #{}: {}\n\n• Rename\n• {}\n• Sources\n• Targets\n• Settings\n• Delete",
            task.id,
            task.name,
            if task.is_active { "Pause" } else { "Resume" }
        ))
        .await
    }

    async fn start_task_rename(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if self.existing_task(&ctx, task_id).await?.is_none() {
            return Ok(());
        }
        ctx.set_pending(PendingInput::TaskRename(task_id)).await;
        ctx.reply(&format!("📝 Send a new name for task #{}", task_id)).await
    }

    async fn toggle_task_active(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        let Some(task) = self.existing_task(&ctx, task_id).await? else {
            return Ok(());
        };
        let active = !task.is_active;
        self.tasks.set_active(task_id, active).await?;
        log::info!("Task #{} {} by user {}", task_id, if active { "resumed" } else { "paused" }, ctx.user_id);
        ctx.reply(&format!(
            "{} Task #{} is now {}",
            if active { "▶️" } else { "⏸" },
            task_id,
            if active { "active" } else { "paused" }
        ))
        .await
    }

    async fn request_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        let Some(task) = self.existing_task(&ctx, task_id).await? else {
            return Ok(());
        };
        ctx.reply(&format!(
            "🗑 Delete task #{} \"{}\" and its settings? This cannot be undone.",
            task.id, task.name
        ))
        .await
    }

    async fn confirm_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        if !self.tasks.delete(task_id).await? {
            return ctx.reply(&format!("❌ Task #{} not found", task_id)).await;
        }
        // The row is already gone with the task; this evicts the cached copy
        self.settings.forget_task(task_id).await;
        log::info!("Task #{} deleted by user {}", task_id, ctx.user_id);
        ctx.reply(&format!("✅ Task #{} deleted", task_id)).await
    }

    async fn cancel_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        ctx.reply(&format!("↩️ Deletion of task #{} cancelled", task_id)).await
    }

    async fn show_task_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let summary = self.settings.format_task_settings(task_id).await;
        ctx.reply(&summary).await
    }

    async fn cycle_forward_mode(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.forward_mode = settings.forward_mode.next();
        let done = format!("📤 Forward mode: {}", settings.forward_mode.title());
        self.save(&ctx, task_id, &settings, &done).await
    }

    async fn set_forward_mode(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (mode, task) = event
            .id
            .strip_prefix("set_mode_")
            .and_then(|rest| rest.rsplit_once('_'))
            .ok_or_else(|| malformed(&event.id))?;
        let mode: ForwardMode = mode.parse().map_err(|_| malformed(&event.id))?;
        let task_id: i64 = task.parse().map_err(|_| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }

        let mut settings = self.settings.get_task(task_id).await;
        settings.forward_mode = mode;
        self.save(&ctx, task_id, &settings, &format!("📤 Forward mode: {}", mode.title()))
            .await
    }

    async fn show_delays(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        ctx.reply(&format!(
            "⏱ Delay for task #{}: {}-{}s\nA random delay in this range is applied before each message.",
            task_id, settings.delay_min, settings.delay_max
        ))
        .await
    }

    async fn set_min_delay(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (task_id, secs) = two_numbers(&event.id, "set_min_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.delay_min = secs;
        if settings.delay_max < secs {
            settings.delay_max = secs;
        }
        let done = format!("⏱ Delay: {}-{}s", settings.delay_min, settings.delay_max);
        self.save(&ctx, task_id, &settings, &done).await
    }

    async fn set_max_delay(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (task_id, secs) = two_numbers(&event.id, "set_max_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.delay_max = secs;
        let done = format!("⏱ Delay: {}-{}s", settings.delay_min, settings.delay_max);
        self.save(&ctx, task_id, &settings, &done).await
    }

    async fn show_limits(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        ctx.reply(&format!(
            "📏 Max message length for task #{}: {} characters",
            task_id, settings.max_message_length
        ))
        .await
    }

    async fn set_max_length(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (task_id, length) = two_numbers(&event.id, "len_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.max_message_length = length;
        self.save(&ctx, task_id, &settings, &format!("📏 Max length: {}", length))
            .await
    }

    async fn reset_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        if self.settings.reset_task(task_id).await {
            ctx.reply(&format!("♻️ Settings of task #{} reset to defaults", task_id)).await
        } else {
            ctx.reply("❌ Failed to reset settings").await
        }
    }

    async fn copy_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (source, target) = two_numbers(&event.id, "settings_copy_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, source).await? || !self.task_exists(&ctx, target).await? {
            return Ok(());
        }
        if self.settings.copy_task(source, target).await {
            ctx.reply(&format!("📋 Settings copied from task #{} to task #{}", source, target))
                .await
        } else {
            ctx.reply("❌ Failed to copy settings").await
        }
    }

    async fn show_media_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        let lines = [
            SettingToggle::FilterMedia,
            SettingToggle::FilterText,
            SettingToggle::FilterForwarded,
            SettingToggle::FilterLinks,
        ]
        .into_iter()
        .map(|toggle| format!("{} {}", on_off(settings.flag(toggle)), toggle.label()))
        .join("\n");
        ctx.reply(&format!("🔍 Filters for task #{}:\n{}", task_id, lines)).await
    }

    async fn show_keyword_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        let current = if settings.keyword_filters.is_empty() {
            "none".to_string()
        } else {
            settings.keyword_filters.join(", ")
        };
        ctx.set_pending(PendingInput::Keyword(task_id)).await;
        ctx.reply(&format!(
            "🔍 Blocked keywords for task #{}: {}\n\nSend a keyword to add it.",
            task_id, current
        ))
        .await
    }

    async fn clear_keyword_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.keyword_filters.clear();
        self.save(&ctx, task_id, &settings, "🧹 Keyword filters cleared").await
    }

    async fn show_replacements(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        let current = if settings.replace_text.is_empty() {
            "none".to_string()
        } else {
            settings
                .replace_text
                .iter()
                .map(|(from, to)| format!("• {} => {}", from, to))
                .join("\n")
        };
        ctx.set_pending(PendingInput::Replacement(task_id)).await;
        ctx.reply(&format!(
            "🔄 Replacements for task #{}:\n{}\n\nSend a rule as: from => to",
            task_id, current
        ))
        .await
    }

    async fn clear_replacements(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        settings.replace_text.clear();
        self.save(&ctx, task_id, &settings, "🧹 Replacements cleared").await
    }

    async fn toggle_setting(
        self: Arc<Self>,
        toggle: SettingToggle,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult {
        let task_id = event
            .id
            .strip_prefix(toggle.prefix().as_str())
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let mut settings = self.settings.get_task(task_id).await;
        let flag = settings.flag_mut(toggle);
        *flag = !*flag;
        let enabled = *flag;

        let notice = format!("{} {}", on_off(enabled), toggle.label());
        if self.settings.update_task(task_id, &settings).await {
            ctx.answer(Some(notice.as_str())).await
        } else {
            ctx.reply("❌ Failed to save settings, try again later").await
        }
    }

    async fn show_channels(
        self: Arc<Self>,
        kind: ChannelKind,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult {
        let task_id = task_arg(&event)?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let channels = self.tasks.channels(kind, task_id).await?;
        let current = if channels.is_empty() {
            "none yet".to_string()
        } else {
            channels.iter().map(|c| format!("• {}", c.display_name())).join("\n")
        };
        ctx.set_pending(PendingInput::Channel(kind, task_id)).await;
        ctx.reply(&format!(
            "{} {} of task #{}:\n{}\n\nSend a chat id to add a {}, optionally followed by a title.",
            if kind == ChannelKind::Source { "📡" } else { "🎯" },
            kind.title(),
            task_id,
            current,
            kind
        ))
        .await
    }

    async fn remove_channel(
        self: Arc<Self>,
        kind: ChannelKind,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult {
        let (task_id, chat_id) = two_numbers(&event.id, &kind.remove_prefix()).ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        if self.tasks.remove_channel(kind, task_id, chat_id).await? {
            log::info!("Chat {} removed as {} of task #{} by user {}", chat_id, kind, task_id, ctx.user_id);
            ctx.reply(&format!("🗑 Chat {} is no longer a {} of task #{}", chat_id, kind, task_id))
                .await
        } else {
            ctx.reply(&format!("❌ Chat {} is not a {} of task #{}", chat_id, kind, task_id))
                .await
        }
    }

    async fn show_presets(self: Arc<Self>, _event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let presets = self.settings.list_presets().await;
        if presets.is_empty() {
            return ctx.reply("📦 No presets saved yet").await;
        }
        let lines = presets
            .iter()
            .map(|(name, preset)| {
                if preset.description.is_empty() {
                    format!("• {}", name)
                } else {
                    format!("• {}: {}", name, preset.description)
                }
            })
            .join("\n");
        ctx.reply(&format!("📦 Presets:\n{}", lines)).await
    }

    async fn apply_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (task_id, name) = task_and_name(&event.id, "preset_apply_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        if self.settings.apply_preset(task_id, name).await {
            ctx.reply(&format!("✅ Preset \"{}\" applied to task #{}", name, task_id)).await
        } else {
            ctx.reply(&format!("❌ Could not apply preset \"{}\"", name)).await
        }
    }

    async fn save_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let (task_id, name) = task_and_name(&event.id, "preset_save_").ok_or_else(|| malformed(&event.id))?;
        if !self.task_exists(&ctx, task_id).await? {
            return Ok(());
        }
        let settings = self.settings.get_task(task_id).await;
        let description = format!("Saved from task #{}", task_id);
        if self.settings.save_preset(name, &settings, &description).await {
            ctx.reply(&format!("💾 Preset \"{}\" saved", name)).await
        } else {
            ctx.reply(&format!("❌ Could not save preset \"{}\"", name)).await
        }
    }

    async fn delete_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult {
        let name = suffix(&event.id, "preset_delete_").ok_or_else(|| malformed(&event.id))?;
        if self.settings.delete_preset(name).await {
            ctx.reply(&format!("🗑 Preset \"{}\" deleted", name)).await
        } else {
            ctx.reply(&format!("❌ Preset \"{}\" not found", name)).await
        }
    }
}
