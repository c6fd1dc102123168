//! Human-readable settings summary shown in the bot

use std::fmt::Write;

use super::model::{SettingToggle, TaskSettings};
use super::store::SettingsStore;

pub const LOAD_FAILED: &str = "❌ Error loading settings";

impl SettingsStore {
    /// Summary of a task's settings, or [`LOAD_FAILED`] when they cannot be read.
    pub async fn format_task_settings(&self, task_id: i64) -> String {
        match self.try_get_task(task_id).await {
            Ok(Some(settings)) => render(task_id, &settings),
            Ok(None) => render(task_id, &TaskSettings::default()),
            Err(e) => {
                log::error!("Cannot render settings for task {}: {}", task_id, e);
                LOAD_FAILED.to_string()
            }
        }
    }
}

fn mark(on: bool) -> &'static str {
    if on {
        "✅"
    } else {
        "❌"
    }
}

pub fn render(task_id: i64, settings: &TaskSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "⚙️ Settings for task #{}", task_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "📤 Mode: {}", settings.forward_mode.title());
    let _ = writeln!(out, "⏱ Delay: {}-{}s", settings.delay_min, settings.delay_max);
    let _ = writeln!(out, "📏 Max length: {}", settings.max_message_length);
    let _ = writeln!(out);

    for toggle in [
        SettingToggle::PreserveSender,
        SettingToggle::AddCaption,
        SettingToggle::DuplicateCheck,
        SettingToggle::FilterMedia,
        SettingToggle::FilterText,
        SettingToggle::FilterForwarded,
        SettingToggle::FilterLinks,
        SettingToggle::RemoveLinks,
        SettingToggle::RemoveMentions,
    ] {
        let _ = writeln!(out, "{} {}", mark(settings.flag(toggle)), toggle.label());
    }

    if let Some(caption) = &settings.custom_caption {
        let _ = writeln!(out);
        let _ = writeln!(out, "📝 Caption: {}", caption);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "🔍 Keyword filters: {}", settings.keyword_filters.len());
    let _ = write!(out, "🔄 Replacements: {}", settings.replace_text.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::model::ForwardMode;

    #[test]
    fn test_render_lists_mode_and_flags() {
        let settings = TaskSettings {
            forward_mode: ForwardMode::Quote,
            filter_links: true,
            keyword_filters: vec!["a".into(), "b".into()],
            ..TaskSettings::default()
        };
        let text = render(3, &settings);
        assert!(text.contains("task #3"));
        assert!(text.contains("Mode: Quote"));
        assert!(text.contains("✅ Filter links"));
        assert!(text.contains("❌ Filter media"));
        assert!(text.contains("Keyword filters: 2"));
        assert!(!text.contains("Caption"));
    }
}
