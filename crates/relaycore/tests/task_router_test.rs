//! The task router wired to a real controller: bootstrap and menu flows

mod common;

use std::sync::Arc;

use common::Harness;
use pretty_assertions::assert_eq;
use relaycore::routing::build_task_router;
use relaycore::settings::{ForwardMode, SettingsStore};
use relaycore::storage::{Storage, TaskRepository};
use relaycore::tasks::TaskController;
use relaycore::testing::memory_storage;

#[test]
fn test_builds_are_equivalent_and_preloaded() {
    let storage: Arc<dyn Storage> = memory_storage().unwrap();
    let settings = Arc::new(SettingsStore::new(Arc::clone(&storage)));
    let controller = Arc::new(TaskController::new(settings, TaskRepository::new(storage)));

    let first = build_task_router(Arc::clone(&controller)).unwrap();
    let second = build_task_router(controller).unwrap();
    assert_eq!(first.rules(), second.rules());
    assert_eq!(first.registered(), second.registered());

    let stats = first.stats();
    assert!(stats.cache_size > 0);
    assert_eq!(stats.requests, 0);
}

#[tokio::test]
async fn test_create_task_through_text_prompt() {
    let h = Harness::new();
    assert!(h.press("task_create").await);
    assert!(h.last_reply().contains("Send a name"));

    assert!(h.type_text("News relay").await);
    assert_eq!(h.last_reply(), "✅ Task #1 \"News relay\" created");
    // The prompt is consumed
    assert!(!h.type_text("stray text").await);

    assert!(h.press("task_list").await);
    assert!(h.last_reply().contains("#1 News relay"));
}

#[tokio::test]
async fn test_toggle_answers_the_callback() {
    let h = Harness::new();
    h.create_task("News").await;
    assert!(h.press("toggle_filter_links_1").await);
    assert_eq!(h.responder.answers(), vec![Some("✅ Filter links".to_string())]);
    assert!(h.settings.get_task(1).await.filter_links);

    assert!(h.press("toggle_filter_links_1").await);
    assert!(!h.settings.get_task(1).await.filter_links);
}

#[tokio::test]
async fn test_set_mode_and_rejected_length() {
    let h = Harness::new();
    h.create_task("News").await;
    assert!(h.press("set_mode_quote_1").await);
    assert_eq!(h.settings.get_task(1).await.forward_mode, ForwardMode::Quote);

    assert!(h.press("len_1_5000").await);
    let reply = h.last_reply();
    assert!(reply.starts_with("❌ Settings not saved"), "{}", reply);
    assert!(reply.contains("Message length must be between 1 and 4096"));
    assert_eq!(h.settings.get_task(1).await.max_message_length, 4096);
}

#[tokio::test]
async fn test_min_delay_pulls_max_up() {
    let h = Harness::new();
    h.create_task("News").await;
    assert!(h.press("set_min_1_30").await);
    let settings = h.settings.get_task(1).await;
    assert_eq!((settings.delay_min, settings.delay_max), (30, 30));
    assert_eq!(h.last_reply(), "⏱ Delay: 30-30s");
}

#[tokio::test]
async fn test_preset_saved_from_one_task_applies_to_another() {
    let h = Harness::new();
    h.create_task("News").await;
    h.create_task("Memes").await;
    h.press("set_mode_forward_1").await;
    assert!(h.press("preset_save_1_fast").await);
    assert_eq!(h.last_reply(), "💾 Preset \"fast\" saved");

    assert!(h.press("preset_apply_2_fast").await);
    assert_eq!(h.last_reply(), "✅ Preset \"fast\" applied to task #2");
    assert_eq!(h.settings.get_task(2).await.forward_mode, ForwardMode::Forward);

    assert!(h.press("preset_list").await);
    assert!(h.last_reply().contains("• fast: Saved from task #1"));
}

#[tokio::test]
async fn test_delete_confirmation_flow() {
    let h = Harness::new();
    h.press("task_create").await;
    h.type_text("Doomed").await;

    assert!(h.press("task_delete_1").await);
    assert!(h.last_reply().contains("Delete task #1 \"Doomed\""));
    assert!(h.press("cancel_delete_task1").await);
    assert!(h.controller.tasks().get(1).await.unwrap().is_some());

    assert!(h.press("confirm_delete_task1").await);
    assert_eq!(h.last_reply(), "✅ Task #1 deleted");
    assert!(h.press("confirm_delete_task1").await);
    assert_eq!(h.last_reply(), "❌ Task #1 not found");
}

#[tokio::test]
async fn test_deleted_task_settings_read_as_defaults() {
    let h = Harness::new();
    h.create_task("Doomed").await;
    assert!(h.press("set_max_1_42").await);
    assert_eq!(h.settings.get_task(1).await.delay_max, 42);

    assert!(h.press("confirm_delete_task1").await);
    assert_eq!(h.last_reply(), "✅ Task #1 deleted");
    assert_eq!(h.settings.get_task(1).await.delay_max, 5);
    assert!(h.storage.get_task_settings(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_buttons_for_a_missing_task_write_nothing() {
    let h = Harness::new();
    for id in [
        "toggle_filter_media_999",
        "set_max_999_42",
        "setting_forward_mode_999",
        "settings_reset_999",
        "filter_keywords_clear_999",
    ] {
        assert!(h.press(id).await, "{}", id);
        assert_eq!(h.last_reply(), "❌ Task #999 not found", "{}", id);
    }
    assert!(h.responder.answers().is_empty());
    assert!(h.storage.get_task_settings(999).await.unwrap().is_none());

    h.create_task("Real").await;
    assert!(h.press("settings_copy_1_999").await);
    assert_eq!(h.last_reply(), "❌ Task #999 not found");
    assert!(h.press("preset_apply_999_fast").await);
    assert_eq!(h.last_reply(), "❌ Task #999 not found");
}

#[tokio::test]
async fn test_keyword_prompt_for_a_missing_task_is_refused() {
    let h = Harness::new();
    assert!(h.press("filter_keywords_7").await);
    assert_eq!(h.last_reply(), "❌ Task #7 not found");
    // No prompt was opened
    assert!(!h.type_text("spam").await);
}

#[tokio::test]
async fn test_tasks_of_another_user_are_hidden() {
    let h = Harness::new();
    h.controller.tasks().create("Theirs", None, Some(7)).await.unwrap();
    let mine = h.create_task("Mine").await;

    assert!(h.press("task_view_1").await);
    assert_eq!(h.last_reply(), "❌ Task #1 not found");
    assert!(h.press("toggle_filter_links_1").await);
    assert_eq!(h.last_reply(), "❌ Task #1 not found");

    assert!(h.press("task_list").await);
    let listing = h.last_reply();
    assert!(listing.contains(&format!("#{} Mine", mine)), "{}", listing);
    assert!(!listing.contains("Theirs"), "{}", listing);
}

#[tokio::test]
async fn test_sources_and_targets_through_prompts() {
    let h = Harness::new();
    h.create_task("Relay").await;

    assert!(h.press("task_sources_1").await);
    assert!(h.last_reply().contains("Sources of task #1:\nnone yet"));
    assert!(h.type_text("not-a-chat").await);
    assert!(h.last_reply().starts_with("⚠️ Send a numeric chat id"));
    // The prompt stays open after bad input
    assert!(h.type_text("-1001 Wire").await);
    assert_eq!(h.last_reply(), "✅ Chat -1001 added as a source of task #1");

    assert!(h.press("task_targets_1").await);
    assert!(h.type_text("-1001").await);
    assert_eq!(h.last_reply(), "⚠️ Chat -1001 is already a source of task #1");
    assert!(h.press("task_targets_1").await);
    assert!(h.type_text("-2002").await);
    assert_eq!(h.last_reply(), "✅ Chat -2002 added as a target of task #1");

    assert!(h.press("task_info_1").await);
    let info = h.last_reply();
    assert!(info.contains("📡 Sources: 1\n🎯 Targets: 1"), "{}", info);

    let relaying: Vec<i64> = h
        .controller
        .tasks()
        .tasks_for_source(-1001)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(relaying, vec![1]);

    assert!(h.press("source_remove_1_-1001").await);
    assert_eq!(h.last_reply(), "🗑 Chat -1001 is no longer a source of task #1");
    assert!(h.press("source_remove_1_-1001").await);
    assert_eq!(h.last_reply(), "❌ Chat -1001 is not a source of task #1");
    assert!(h.press("task_sources_1").await);
    assert!(h.last_reply().contains("none yet"));
}

#[tokio::test]
async fn test_unknown_and_malformed_identifiers() {
    let h = Harness::new();
    assert!(!h.press("nope").await);
    assert!(!h.press("task_view_abc").await);
    assert!(h.responder.replies().is_empty());
}
