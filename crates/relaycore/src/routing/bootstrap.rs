//! Wires the task-management callback catalogue into a route table

use async_trait::async_trait;
use std::sync::Arc;
use strum::IntoEnumIterator;

use super::handler::{handler_fn, CallbackEvent, HandlerResult, SessionContext};
use super::table::RouteTable;
use crate::core::config::routing::COMMON_ROUTES;
use crate::core::error::AppResult;
use crate::settings::SettingToggle;
use crate::storage::ChannelKind;

/// The business operations reachable from callback buttons.
///
/// Every operation parses its own argument out of `event.id`.
#[async_trait]
pub trait CallbackProvider: Send + Sync + 'static {
    // Task lifecycle
    async fn start_task_creation(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task_list(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn refresh_task_list(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task_stats(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task_page(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task_info(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_task_edit(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn start_task_rename(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn toggle_task_active(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn request_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn confirm_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn cancel_task_delete(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;

    // Settings editing
    async fn show_task_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn cycle_forward_mode(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn set_forward_mode(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_delays(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn set_min_delay(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn set_max_delay(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_limits(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn set_max_length(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn reset_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn copy_settings(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;

    // Filters
    async fn show_media_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_keyword_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn clear_keyword_filters(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn show_replacements(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn clear_replacements(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;

    // Toggles
    async fn toggle_setting(
        self: Arc<Self>,
        toggle: SettingToggle,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult;

    // Source and target chats
    async fn show_channels(
        self: Arc<Self>,
        kind: ChannelKind,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult;
    async fn remove_channel(
        self: Arc<Self>,
        kind: ChannelKind,
        event: CallbackEvent,
        ctx: SessionContext,
    ) -> HandlerResult;

    // Presets
    async fn show_presets(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn apply_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn save_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
    async fn delete_preset(self: Arc<Self>, event: CallbackEvent, ctx: SessionContext) -> HandlerResult;
}

macro_rules! bind {
    ($provider:expr, $method:ident) => {{
        let provider = Arc::clone($provider);
        handler_fn(move |event, ctx| Arc::clone(&provider).$method(event, ctx))
    }};
}

/// Builds a fresh route table for `provider`.
///
/// Exact routes go in first, then prefixes, then patterns, then the common
/// identifiers are preloaded. Each call yields an equivalent table.
pub fn build_task_router<P: CallbackProvider>(provider: Arc<P>) -> AppResult<RouteTable> {
    let p = &provider;
    let mut table = RouteTable::new();

    // Exact
    table.register_exact("task_create", bind!(p, start_task_creation));
    table.register_exact("task_list", bind!(p, show_task_list));
    table.register_exact("task_refresh", bind!(p, refresh_task_list));
    table.register_exact("task_stats", bind!(p, show_task_stats));
    table.register_exact("preset_list", bind!(p, show_presets));

    // Prefix: task lifecycle
    table.register_prefix("task_list_page_", bind!(p, show_task_page));
    table.register_prefix("task_view_", bind!(p, show_task));
    table.register_prefix("task_info_", bind!(p, show_task_info));
    table.register_prefix("task_edit_", bind!(p, show_task_edit));
    table.register_prefix("task_edit_name_", bind!(p, start_task_rename));
    table.register_prefix("task_toggle_", bind!(p, toggle_task_active));
    table.register_prefix("task_delete_", bind!(p, request_task_delete));

    // Prefix: settings
    table.register_prefix("task_settings_", bind!(p, show_task_settings));
    table.register_prefix("setting_forward_mode_", bind!(p, cycle_forward_mode));
    table.register_prefix("setting_delays_", bind!(p, show_delays));
    table.register_prefix("setting_limits_", bind!(p, show_limits));
    table.register_prefix("setting_filters_", bind!(p, show_media_filters));
    table.register_prefix("settings_reset_", bind!(p, reset_settings));
    table.register_prefix("settings_copy_", bind!(p, copy_settings));

    // Prefix: filters
    table.register_prefix("filter_keywords_", bind!(p, show_keyword_filters));
    table.register_prefix("filter_keywords_clear_", bind!(p, clear_keyword_filters));
    table.register_prefix("content_replace_", bind!(p, show_replacements));
    table.register_prefix("content_replace_clear_", bind!(p, clear_replacements));

    // Prefix: toggles
    for toggle in SettingToggle::iter() {
        let provider = Arc::clone(p);
        table.register_prefix(
            toggle.prefix(),
            handler_fn(move |event, ctx| Arc::clone(&provider).toggle_setting(toggle, event, ctx)),
        );
    }

    // Prefix: channels
    for kind in ChannelKind::iter() {
        let provider = Arc::clone(p);
        table.register_prefix(
            kind.menu_prefix(),
            handler_fn(move |event, ctx| Arc::clone(&provider).show_channels(kind, event, ctx)),
        );
    }

    // Prefix: presets
    table.register_prefix("preset_apply_", bind!(p, apply_preset));
    table.register_prefix("preset_save_", bind!(p, save_preset));
    table.register_prefix("preset_delete_", bind!(p, delete_preset));

    // Patterns
    table.register_pattern(r"^confirm_delete_task\d+$", bind!(p, confirm_task_delete))?;
    table.register_pattern(r"^cancel_delete_task\d+$", bind!(p, cancel_task_delete))?;
    table.register_pattern(r"^len_\d+_\d+$", bind!(p, set_max_length))?;
    table.register_pattern(r"^set_min_\d+_\d+$", bind!(p, set_min_delay))?;
    table.register_pattern(r"^set_max_\d+_\d+$", bind!(p, set_max_delay))?;
    table.register_pattern(r"^set_mode_(copy|forward|quote)_\d+$", bind!(p, set_forward_mode))?;
    for kind in ChannelKind::iter() {
        let provider = Arc::clone(p);
        table.register_pattern(
            &format!(r"^{}\d+_-?\d+$", kind.remove_prefix()),
            handler_fn(move |event, ctx| Arc::clone(&provider).remove_channel(kind, event, ctx)),
        )?;
    }

    let warmed = table.preload(COMMON_ROUTES);
    log::info!(
        "Task router ready: {} routes, {}/{} common routes preloaded",
        table.registered(),
        warmed,
        COMMON_ROUTES.len()
    );
    Ok(table)
}
