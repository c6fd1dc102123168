//! Named settings presets, kept as one JSON map in the `settings_presets`
//! system setting

use chrono::Utc;
use rusqlite::types::Value;
use serde_json::Map;
use std::collections::BTreeMap;

use super::model::{SettingValue, SettingsPreset, TaskSettings, ValueType};
use super::store::SettingsStore;
use super::validation;
use crate::core::config::presets::{MAX_WRITE_ATTEMPTS, PRESETS_DESCRIPTION, PRESETS_KEY};
use crate::core::error::{AppError, AppResult};
use crate::core::metrics;

type PresetMap = Map<String, serde_json::Value>;

const CAS_UPDATE_SQL: &str = "UPDATE system_settings \
     SET value = ?2, value_type = ?3, updated_at = CURRENT_TIMESTAMP \
     WHERE key = ?1 AND value = ?4";

const CAS_INSERT_SQL: &str = "INSERT INTO system_settings \
     (key, value, value_type, description, is_public, created_at, updated_at) \
     VALUES (?1, ?2, ?3, ?4, 0, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP) \
     ON CONFLICT (key) DO NOTHING";

impl SettingsStore {
    pub async fn get_preset(&self, name: &str) -> Option<SettingsPreset> {
        let presets = self.get_system(PRESETS_KEY, empty_map()).await;
        let raw = presets.as_json()?.get(name)?.clone();
        serde_json::from_value(raw)
            .map_err(|e| log::warn!("Preset '{}' is malformed: {}", name, e))
            .ok()
    }

    /// All decodable presets by name.
    pub async fn list_presets(&self) -> BTreeMap<String, SettingsPreset> {
        let presets = self.get_system(PRESETS_KEY, empty_map()).await;
        let Some(serde_json::Value::Object(map)) = presets.as_json() else {
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(name, raw)| match serde_json::from_value(raw.clone()) {
                Ok(preset) => Some((name.clone(), preset)),
                Err(e) => {
                    log::warn!("Skipping malformed preset '{}': {}", name, e);
                    None
                }
            })
            .collect()
    }

    /// Stores `settings` under `name`, replacing any preset of that name.
    pub async fn save_preset(&self, name: &str, settings: &TaskSettings, description: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            log::warn!("Refusing to save a preset with an empty name");
            return false;
        }
        let report = validation::validate(settings);
        if !report.is_valid() {
            for error in report.errors() {
                log::warn!("Rejected preset '{}': {}", name, error);
            }
            return false;
        }

        let preset = SettingsPreset {
            settings: validation::normalize(settings).without_identity(),
            description: description.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let encoded = match serde_json::to_value(&preset) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("Failed to encode preset '{}': {}", name, e);
                return false;
            }
        };

        let result = self
            .mutate_presets(|map| {
                map.insert(name.to_string(), encoded.clone());
                true
            })
            .await;
        self.report_preset_write("save", name, result)
    }

    /// `false` when no such preset exists or the write fails.
    pub async fn delete_preset(&self, name: &str) -> bool {
        let result = self.mutate_presets(|map| map.remove(name).is_some()).await;
        self.report_preset_write("delete", name, result)
    }

    /// Writes the preset's settings as the task's settings.
    pub async fn apply_preset(&self, task_id: i64, name: &str) -> bool {
        let Some(preset) = self.get_preset(name).await else {
            log::warn!("Preset '{}' not found, task {} left unchanged", name, task_id);
            return false;
        };
        let applied = self.update_task(task_id, &preset.settings).await;
        if applied {
            log::info!("Preset '{}' applied to task {}", name, task_id);
        }
        applied
    }

    fn report_preset_write(&self, action: &str, name: &str, result: AppResult<bool>) -> bool {
        match result {
            Ok(true) => {
                log::info!("Preset '{}': {} done", name, action);
                true
            }
            Ok(false) => {
                log::warn!("Preset '{}': nothing to {}", name, action);
                false
            }
            Err(e) => {
                log::error!("Preset '{}': {} failed: {}", name, action, e);
                metrics::record_storage_error("presets");
                false
            }
        }
    }

    /// Read-modify-write of the preset map with compare-and-set.
    ///
    /// The row is re-read from storage on each attempt and written back only
    /// if its text is still what was read. `mutate` returning `false` means
    /// there is nothing to write.
    async fn mutate_presets<F>(&self, mut mutate: F) -> AppResult<bool>
    where
        F: FnMut(&mut PresetMap) -> bool + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let rows = self
                .storage
                .execute_query(
                    "SELECT value FROM system_settings WHERE key = ?1",
                    vec![Value::Text(PRESETS_KEY.to_string())],
                )
                .await?;
            let previous = rows.first().and_then(|row| row.text("value"));

            let mut map = match previous.as_deref().map(parse_map) {
                Some(Ok(map)) => map,
                Some(Err(e)) => {
                    log::warn!("Stored presets are malformed, starting from an empty map: {}", e);
                    PresetMap::new()
                }
                None => PresetMap::new(),
            };
            if !mutate(&mut map) {
                return Ok(false);
            }

            let updated = serde_json::Value::Object(map);
            let encoded = updated.to_string();
            let tag = Value::Text(ValueType::Json.to_string());
            let affected = match previous {
                Some(previous) => {
                    self.storage
                        .execute_command(
                            CAS_UPDATE_SQL,
                            vec![
                                Value::Text(PRESETS_KEY.to_string()),
                                Value::Text(encoded),
                                tag,
                                Value::Text(previous),
                            ],
                        )
                        .await?
                }
                None => {
                    self.storage
                        .execute_command(
                            CAS_INSERT_SQL,
                            vec![
                                Value::Text(PRESETS_KEY.to_string()),
                                Value::Text(encoded),
                                tag,
                                Value::Text(PRESETS_DESCRIPTION.to_string()),
                            ],
                        )
                        .await?
                }
            };

            if affected > 0 {
                self.cache_system(PRESETS_KEY, SettingValue::Json(updated)).await;
                return Ok(true);
            }
            log::debug!(
                "Presets changed concurrently (attempt {}/{}), retrying",
                attempt,
                MAX_WRITE_ATTEMPTS
            );
        }

        Err(AppError::Conflict(PRESETS_KEY.to_string()))
    }
}

fn parse_map(raw: &str) -> AppResult<PresetMap> {
    if raw.trim().is_empty() {
        return Ok(PresetMap::new());
    }
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(AppError::Decode(format!("presets are not a JSON object: {}", other))),
    }
}

fn empty_map() -> SettingValue {
    SettingValue::Json(serde_json::Value::Object(PresetMap::new()))
}
