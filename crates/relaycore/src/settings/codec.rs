//! Row <-> settings conversion for the `system_settings` and `task_settings` tables

use rusqlite::types::Value;
use std::collections::BTreeMap;

use super::model::{ForwardMode, SettingValue, SystemSetting, TaskSettings, ValueType};
use crate::core::error::{AppError, AppResult};
use crate::storage::Row;

pub(crate) const SELECT_SYSTEM_SQL: &str = "SELECT value, value_type FROM system_settings WHERE key = ?1";

pub(crate) const UPSERT_SYSTEM_SQL: &str = "INSERT INTO system_settings \
     (key, value, value_type, description, is_public, created_at, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) \
     ON CONFLICT (key) DO UPDATE SET \
         value = excluded.value, \
         value_type = excluded.value_type, \
         description = excluded.description, \
         is_public = excluded.is_public, \
         updated_at = CURRENT_TIMESTAMP";

pub(crate) const INSERT_TASK_SQL: &str = "INSERT INTO task_settings (\
     task_id, forward_mode, preserve_sender, add_caption, custom_caption, \
     filter_media, filter_text, filter_forwarded, filter_links, keyword_filters, \
     delay_min, delay_max, remove_links, remove_mentions, replace_text, \
     duplicate_check, max_message_length, created_at, updated_at\
     ) VALUES (\
     ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
     ?11, ?12, ?13, ?14, ?15, ?16, ?17, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)";

pub(crate) const UPDATE_TASK_SQL: &str = "UPDATE task_settings SET \
     forward_mode = ?2, \
     preserve_sender = ?3, \
     add_caption = ?4, \
     custom_caption = ?5, \
     filter_media = ?6, \
     filter_text = ?7, \
     filter_forwarded = ?8, \
     filter_links = ?9, \
     keyword_filters = ?10, \
     delay_min = ?11, \
     delay_max = ?12, \
     remove_links = ?13, \
     remove_mentions = ?14, \
     replace_text = ?15, \
     duplicate_check = ?16, \
     max_message_length = ?17, \
     updated_at = CURRENT_TIMESTAMP \
     WHERE task_id = ?1";

/// Decodes a `(value, value_type)` row.
pub(crate) fn decode_system_value(row: &Row) -> AppResult<SettingValue> {
    let raw = row.text("value").unwrap_or_default();
    let tag = row
        .text("value_type")
        .ok_or_else(|| AppError::Decode("setting row without value_type".to_string()))?;
    let value_type: ValueType = tag
        .parse()
        .map_err(|_| AppError::Decode(format!("unknown value_type '{}'", tag)))?;
    SettingValue::decode(&raw, value_type)
}

/// Decodes a full `system_settings` row.
pub(crate) fn decode_system_setting(row: &Row) -> AppResult<SystemSetting> {
    let key = row
        .text("key")
        .ok_or_else(|| AppError::Decode("setting row without key".to_string()))?;
    Ok(SystemSetting {
        key,
        value: decode_system_value(row)?,
        description: row.text("description").unwrap_or_default(),
        is_public: row.bool("is_public").unwrap_or(false),
        created_at: row.timestamp("created_at"),
        updated_at: row.timestamp("updated_at"),
    })
}

/// Decodes a `task_settings` row.
///
/// Every column falls back to its default on its own, so one malformed
/// column (e.g. broken JSON in `keyword_filters`) never loses the rest.
pub(crate) fn decode_task_row(row: &Row) -> TaskSettings {
    let defaults = TaskSettings::default();
    let flag = |column: &str, default: bool| row.bool(column).unwrap_or(default);

    let forward_mode = match row.text("forward_mode") {
        Some(raw) => raw.parse::<ForwardMode>().unwrap_or_else(|_| {
            log::warn!("Unknown forward_mode '{}' in task_settings, using copy", raw);
            ForwardMode::Copy
        }),
        None => defaults.forward_mode,
    };

    TaskSettings {
        task_id: row.int("task_id"),
        forward_mode,
        preserve_sender: flag("preserve_sender", defaults.preserve_sender),
        add_caption: flag("add_caption", defaults.add_caption),
        custom_caption: row.text("custom_caption"),
        filter_media: flag("filter_media", defaults.filter_media),
        filter_text: flag("filter_text", defaults.filter_text),
        filter_forwarded: flag("filter_forwarded", defaults.filter_forwarded),
        filter_links: flag("filter_links", defaults.filter_links),
        keyword_filters: decode_json_column::<Vec<String>>(row, "keyword_filters"),
        delay_min: row.int("delay_min").unwrap_or(defaults.delay_min),
        delay_max: row.int("delay_max").unwrap_or(defaults.delay_max),
        remove_links: flag("remove_links", defaults.remove_links),
        remove_mentions: flag("remove_mentions", defaults.remove_mentions),
        replace_text: decode_json_column::<BTreeMap<String, String>>(row, "replace_text"),
        duplicate_check: flag("duplicate_check", defaults.duplicate_check),
        max_message_length: row.int("max_message_length").unwrap_or(defaults.max_message_length),
        created_at: row.timestamp("created_at"),
        updated_at: row.timestamp("updated_at"),
    }
}

fn decode_json_column<T>(row: &Row, column: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(raw) = row.text(column) else {
        return T::default();
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Malformed JSON in task_settings.{}: {}", column, e);
        T::default()
    })
}

/// The 17 positional parameters shared by [`INSERT_TASK_SQL`] and [`UPDATE_TASK_SQL`].
pub(crate) fn task_params(task_id: i64, settings: &TaskSettings) -> AppResult<Vec<Value>> {
    Ok(vec![
        Value::Integer(task_id),
        Value::Text(settings.forward_mode.to_string()),
        Value::from(settings.preserve_sender),
        Value::from(settings.add_caption),
        settings.custom_caption.clone().into(),
        Value::from(settings.filter_media),
        Value::from(settings.filter_text),
        Value::from(settings.filter_forwarded),
        Value::from(settings.filter_links),
        Value::Text(serde_json::to_string(&settings.keyword_filters)?),
        Value::Integer(settings.delay_min),
        Value::Integer(settings.delay_max),
        Value::from(settings.remove_links),
        Value::from(settings.remove_mentions),
        Value::Text(serde_json::to_string(&settings.replace_text)?),
        Value::from(settings.duplicate_check),
        Value::Integer(settings.max_message_length),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_params_count_and_json() {
        let settings = TaskSettings {
            keyword_filters: vec!["spam".into()],
            ..TaskSettings::default()
        };
        let params = task_params(3, &settings).unwrap();
        assert_eq!(params.len(), 17);
        assert_eq!(params[1], Value::Text("copy".into()));
        assert_eq!(params[9], Value::Text(r#"["spam"]"#.into()));
        assert_eq!(params[15], Value::Integer(1));
    }

    #[test]
    fn test_decode_task_row_tolerates_bad_columns() {
        let row = Row::new()
            .with("task_id", 4i64)
            .with("forward_mode", "teleport".to_string())
            .with("keyword_filters", "[not json".to_string())
            .with("replace_text", r#"{"a":"b"}"#.to_string())
            .with("delay_max", 9i64)
            .with("filter_links", 1i64);

        let settings = decode_task_row(&row);
        assert_eq!(settings.task_id, Some(4));
        assert_eq!(settings.forward_mode, ForwardMode::Copy);
        assert!(settings.keyword_filters.is_empty());
        assert_eq!(settings.replace_text.get("a").map(String::as_str), Some("b"));
        assert_eq!(settings.delay_max, 9);
        assert!(settings.filter_links);
        assert!(settings.duplicate_check);
    }

    #[test]
    fn test_decode_system_value_unknown_tag() {
        let row = Row::new()
            .with("value", "1".to_string())
            .with("value_type", "float".to_string());
        assert!(decode_system_value(&row).is_err());
    }
}
