//! Settings value types: system settings, task settings and presets

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::core::error::{AppError, AppResult};

/// Storage tag describing how a system setting's text is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Boolean,
    Json,
}

/// A typed system setting value.
///
/// Persisted as text plus a [`ValueType`] tag; the variant decides the tag,
/// so a value can never be stored under a mismatching type.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Json(serde_json::Value),
}

impl SettingValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            SettingValue::String(_) => ValueType::String,
            SettingValue::Integer(_) => ValueType::Integer,
            SettingValue::Boolean(_) => ValueType::Boolean,
            SettingValue::Json(_) => ValueType::Json,
        }
    }

    /// Text form written to the `value` column.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::String(s) => s.clone(),
            SettingValue::Integer(i) => i.to_string(),
            SettingValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            SettingValue::Json(v) => v.to_string(),
        }
    }

    /// Decodes stored text by its type tag.
    ///
    /// Empty integers read as 0 and empty JSON as an empty object; booleans
    /// are true only for the literal "true" (any case).
    pub fn decode(raw: &str, value_type: ValueType) -> AppResult<Self> {
        match value_type {
            ValueType::String => Ok(SettingValue::String(raw.to_string())),
            ValueType::Integer => {
                if raw.trim().is_empty() {
                    return Ok(SettingValue::Integer(0));
                }
                raw.trim()
                    .parse::<i64>()
                    .map(SettingValue::Integer)
                    .map_err(|e| AppError::Decode(format!("invalid integer '{}': {}", raw, e)))
            }
            ValueType::Boolean => Ok(SettingValue::Boolean(raw.trim().eq_ignore_ascii_case("true"))),
            ValueType::Json => {
                if raw.trim().is_empty() {
                    return Ok(SettingValue::Json(serde_json::Value::Object(Default::default())));
                }
                Ok(SettingValue::Json(serde_json::from_str(raw)?))
            }
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            SettingValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<serde_json::Value> for SettingValue {
    fn from(value: serde_json::Value) -> Self {
        SettingValue::Json(value)
    }
}

/// A persisted system setting as returned by the bulk listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSetting {
    pub key: String,
    pub value: SettingValue,
    pub description: String,
    pub is_public: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// How a message is relayed to the destination.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ForwardMode {
    /// Re-send the content without the "forwarded from" header
    #[default]
    Copy,
    /// Native Telegram forward
    Forward,
    /// Copy with the original quoted
    Quote,
}

impl ForwardMode {
    /// Next mode in the copy → forward → quote cycle.
    pub fn next(self) -> Self {
        match self {
            ForwardMode::Copy => ForwardMode::Forward,
            ForwardMode::Forward => ForwardMode::Quote,
            ForwardMode::Quote => ForwardMode::Copy,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ForwardMode::Copy => "Copy",
            ForwardMode::Forward => "Forward",
            ForwardMode::Quote => "Quote",
        }
    }
}

/// Per-task forwarding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    pub forward_mode: ForwardMode,
    pub preserve_sender: bool,
    pub add_caption: bool,
    pub custom_caption: Option<String>,
    pub filter_media: bool,
    pub filter_text: bool,
    pub filter_forwarded: bool,
    pub filter_links: bool,
    pub keyword_filters: Vec<String>,
    pub delay_min: i64,
    pub delay_max: i64,
    pub remove_links: bool,
    pub remove_mentions: bool,
    pub replace_text: BTreeMap<String, String>,
    pub duplicate_check: bool,
    pub max_message_length: i64,
    #[serde(skip)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            task_id: None,
            forward_mode: ForwardMode::Copy,
            preserve_sender: false,
            add_caption: false,
            custom_caption: None,
            filter_media: false,
            filter_text: false,
            filter_forwarded: false,
            filter_links: false,
            keyword_filters: Vec::new(),
            delay_min: 0,
            delay_max: 5,
            remove_links: false,
            remove_mentions: false,
            replace_text: BTreeMap::new(),
            duplicate_check: true,
            max_message_length: 4096,
            created_at: None,
            updated_at: None,
        }
    }
}

impl TaskSettings {
    /// Copy with identity and timestamps stripped, ready to be written under
    /// another task id or stored in a preset.
    pub fn without_identity(&self) -> Self {
        Self {
            task_id: None,
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }

    pub fn flag(&self, toggle: SettingToggle) -> bool {
        match toggle {
            SettingToggle::PreserveSender => self.preserve_sender,
            SettingToggle::AddCaption => self.add_caption,
            SettingToggle::FilterMedia => self.filter_media,
            SettingToggle::FilterText => self.filter_text,
            SettingToggle::FilterForwarded => self.filter_forwarded,
            SettingToggle::FilterLinks => self.filter_links,
            SettingToggle::RemoveLinks => self.remove_links,
            SettingToggle::RemoveMentions => self.remove_mentions,
            SettingToggle::DuplicateCheck => self.duplicate_check,
        }
    }

    pub fn flag_mut(&mut self, toggle: SettingToggle) -> &mut bool {
        match toggle {
            SettingToggle::PreserveSender => &mut self.preserve_sender,
            SettingToggle::AddCaption => &mut self.add_caption,
            SettingToggle::FilterMedia => &mut self.filter_media,
            SettingToggle::FilterText => &mut self.filter_text,
            SettingToggle::FilterForwarded => &mut self.filter_forwarded,
            SettingToggle::FilterLinks => &mut self.filter_links,
            SettingToggle::RemoveLinks => &mut self.remove_links,
            SettingToggle::RemoveMentions => &mut self.remove_mentions,
            SettingToggle::DuplicateCheck => &mut self.duplicate_check,
        }
    }
}

/// The boolean task settings that have an on/off button.
///
/// The serialized name is the middle of the button's callback prefix:
/// `toggle_<name>_<task_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SettingToggle {
    PreserveSender,
    AddCaption,
    FilterMedia,
    FilterText,
    FilterForwarded,
    FilterLinks,
    RemoveLinks,
    RemoveMentions,
    #[strum(to_string = "filter_duplicates")]
    DuplicateCheck,
}

impl SettingToggle {
    /// Callback prefix of this toggle's button.
    pub fn prefix(self) -> String {
        format!("toggle_{}_", self.as_ref())
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingToggle::PreserveSender => "Preserve sender",
            SettingToggle::AddCaption => "Add caption",
            SettingToggle::FilterMedia => "Filter media",
            SettingToggle::FilterText => "Filter text",
            SettingToggle::FilterForwarded => "Filter forwarded",
            SettingToggle::FilterLinks => "Filter links",
            SettingToggle::RemoveLinks => "Remove links",
            SettingToggle::RemoveMentions => "Remove mentions",
            SettingToggle::DuplicateCheck => "Duplicate check",
        }
    }
}

/// A named, reusable bundle of task settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsPreset {
    pub settings: TaskSettings,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 creation time
    #[serde(default)]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_decode_by_type_tag() {
        assert_eq!(SettingValue::decode("42", ValueType::Integer).unwrap(), SettingValue::Integer(42));
        assert_eq!(SettingValue::decode("", ValueType::Integer).unwrap(), SettingValue::Integer(0));
        assert_eq!(SettingValue::decode("TRUE", ValueType::Boolean).unwrap(), SettingValue::Boolean(true));
        assert_eq!(SettingValue::decode("yes", ValueType::Boolean).unwrap(), SettingValue::Boolean(false));
        assert_eq!(
            SettingValue::decode(r#"{"a":1}"#, ValueType::Json).unwrap(),
            SettingValue::Json(serde_json::json!({"a": 1}))
        );
        assert!(SettingValue::decode("forty", ValueType::Integer).is_err());
        assert!(SettingValue::decode("{broken", ValueType::Json).is_err());
    }

    #[test]
    fn test_encode_matches_type() {
        let value = SettingValue::from(false);
        assert_eq!(value.encode(), "false");
        assert_eq!(value.value_type(), ValueType::Boolean);
        assert_eq!(ValueType::Json.to_string(), "json");
        assert_eq!("integer".parse::<ValueType>().unwrap(), ValueType::Integer);
    }

    #[test]
    fn test_forward_mode_cycle_and_parse() {
        assert_eq!(ForwardMode::Copy.next(), ForwardMode::Forward);
        assert_eq!(ForwardMode::Quote.next(), ForwardMode::Copy);
        assert_eq!("quote".parse::<ForwardMode>().unwrap(), ForwardMode::Quote);
        assert!("mirror".parse::<ForwardMode>().is_err());
    }

    #[test]
    fn test_toggle_prefixes_are_unique() {
        let prefixes: Vec<String> = SettingToggle::iter().map(SettingToggle::prefix).collect();
        assert!(prefixes.contains(&"toggle_filter_duplicates_".to_string()));
        assert!(prefixes.contains(&"toggle_preserve_sender_".to_string()));
        let mut deduped = prefixes.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), prefixes.len());
    }

    #[test]
    fn test_flag_mut_flips_the_right_field() {
        let mut settings = TaskSettings::default();
        *settings.flag_mut(SettingToggle::FilterLinks) = true;
        assert!(settings.filter_links);
        assert!(settings.flag(SettingToggle::FilterLinks));
        assert!(settings.flag(SettingToggle::DuplicateCheck));
    }

    #[test]
    fn test_task_settings_json_skips_identity() {
        let mut settings = TaskSettings::default();
        settings.task_id = None;
        let json = serde_json::to_value(&settings).unwrap();
        assert!(json.get("task_id").is_none());
        assert_eq!(json["forward_mode"], "copy");

        let partial: TaskSettings = serde_json::from_str(r#"{"delay_max": 1}"#).unwrap();
        assert_eq!(partial.delay_max, 1);
        assert!(partial.duplicate_check);
    }
}
