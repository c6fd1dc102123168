//! Settings store: system settings and per-task settings behind
//! in-process read caches

use rusqlite::types::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::codec::{self, INSERT_TASK_SQL, SELECT_SYSTEM_SQL, UPDATE_TASK_SQL, UPSERT_SYSTEM_SQL};
use super::model::{SettingValue, SystemSetting, TaskSettings};
use super::validation::{self, Validation};
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::storage::Storage;

/// Typed configuration with read-through / write-through caching.
///
/// The `try_*` methods surface backend failures as `Err` and absence as
/// `Ok(None)`. The plain methods never fail: reads degrade to a default and
/// writes report `false`, with the failure logged.
///
/// Caches are per process and have no TTL. A write becomes visible to every
/// later read in this process once it succeeds in storage.
pub struct SettingsStore {
    pub(super) storage: Arc<dyn Storage>,
    system_cache: RwLock<HashMap<String, SettingValue>>,
    /// `None` entries remember that a task has no stored record yet
    task_cache: RwLock<HashMap<i64, Option<TaskSettings>>>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            system_cache: RwLock::new(HashMap::new()),
            task_cache: RwLock::new(HashMap::new()),
        }
    }

    // ==================== System settings ====================

    /// Cached system setting, `Ok(None)` when the key was never written.
    pub async fn try_get_system(&self, key: &str) -> AppResult<Option<SettingValue>> {
        if let Some(value) = self.system_cache.read().await.get(key) {
            metrics::record_settings_cache("system", true);
            return Ok(Some(value.clone()));
        }
        metrics::record_settings_cache("system", false);

        let value = self.fetch_system(key).await?;
        if let Some(value) = &value {
            self.cache_system(key, value.clone()).await;
        }
        Ok(value)
    }

    /// System setting or `default` when missing, undecodable or unreachable.
    pub async fn get_system(&self, key: &str, default: SettingValue) -> SettingValue {
        match self.try_get_system(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                log::warn!("Failed to read system setting '{}', using default: {}", key, e);
                metrics::record_storage_error("get_system");
                default
            }
        }
    }

    /// Upserts a system setting; the value's variant decides the stored type tag.
    pub async fn set_system(
        &self,
        key: &str,
        value: impl Into<SettingValue>,
        description: &str,
        is_public: bool,
    ) -> bool {
        let value = value.into();
        match self.try_set_system(key, &value, description, is_public).await {
            Ok(()) => {
                log::debug!("System setting '{}' set to {} ({})", key, value, value.value_type());
                self.cache_system(key, value).await;
                true
            }
            Err(e) => {
                log::error!("Failed to write system setting '{}': {}", key, e);
                metrics::record_storage_error("set_system");
                false
            }
        }
    }

    async fn try_set_system(
        &self,
        key: &str,
        value: &SettingValue,
        description: &str,
        is_public: bool,
    ) -> AppResult<()> {
        self.storage
            .execute_command(
                UPSERT_SYSTEM_SQL,
                vec![
                    Value::Text(key.to_string()),
                    Value::Text(value.encode()),
                    Value::Text(value.value_type().to_string()),
                    Value::Text(description.to_string()),
                    Value::from(is_public),
                ],
            )
            .await?;
        Ok(())
    }

    /// Fresh listing ordered by key. Does not touch the cache.
    pub async fn try_get_all_system(&self, public_only: bool) -> AppResult<Vec<SystemSetting>> {
        let sql = if public_only {
            "SELECT * FROM system_settings WHERE is_public = 1 ORDER BY key"
        } else {
            "SELECT * FROM system_settings ORDER BY key"
        };
        let rows = self.storage.execute_query(sql, vec![]).await?;

        let settings = rows
            .iter()
            .filter_map(|row| match codec::decode_system_setting(row) {
                Ok(setting) => Some(setting),
                Err(e) => {
                    log::warn!("Skipping undecodable system setting row: {}", e);
                    None
                }
            })
            .collect();
        Ok(settings)
    }

    pub async fn get_all_system(&self, public_only: bool) -> Vec<SystemSetting> {
        self.try_get_all_system(public_only).await.unwrap_or_else(|e| {
            log::error!("Failed to list system settings: {}", e);
            metrics::record_storage_error("get_all_system");
            Vec::new()
        })
    }

    /// Removes the row and the cache entry. `false` only on backend failure.
    pub async fn delete_system(&self, key: &str) -> bool {
        let result = self
            .storage
            .execute_command(
                "DELETE FROM system_settings WHERE key = ?1",
                vec![Value::Text(key.to_string())],
            )
            .await;
        match result {
            Ok(_) => {
                self.system_cache.write().await.remove(key);
                true
            }
            Err(e) => {
                log::error!("Failed to delete system setting '{}': {}", key, e);
                metrics::record_storage_error("delete_system");
                false
            }
        }
    }

    /// Loads every system setting into the cache, returning how many were cached.
    pub async fn prime_cache(&self) -> usize {
        let settings = self.get_all_system(false).await;
        let mut cache = self.system_cache.write().await;
        for setting in &settings {
            cache.insert(setting.key.clone(), setting.value.clone());
        }
        log::info!("Settings cache primed with {} system settings", settings.len());
        settings.len()
    }

    pub async fn clear_cache(&self) {
        self.system_cache.write().await.clear();
        self.task_cache.write().await.clear();
        log::debug!("Settings caches cleared");
    }

    pub(super) async fn fetch_system(&self, key: &str) -> AppResult<Option<SettingValue>> {
        let rows = self
            .storage
            .execute_query(SELECT_SYSTEM_SQL, vec![Value::Text(key.to_string())])
            .await?;
        rows.first().map(codec::decode_system_value).transpose()
    }

    pub(super) async fn cache_system(&self, key: &str, value: SettingValue) {
        self.system_cache.write().await.insert(key.to_string(), value);
    }

    // ==================== Task settings ====================

    /// Stored settings of a task, `Ok(None)` when none were ever written.
    pub async fn try_get_task(&self, task_id: i64) -> AppResult<Option<TaskSettings>> {
        if let Some(entry) = self.task_cache.read().await.get(&task_id) {
            metrics::record_settings_cache("task", true);
            return Ok(entry.clone());
        }
        metrics::record_settings_cache("task", false);

        let settings = self
            .storage
            .get_task_settings(task_id)
            .await?
            .map(|row| codec::decode_task_row(&row));
        self.task_cache.write().await.insert(task_id, settings.clone());
        Ok(settings)
    }

    /// Settings of a task, materializing the defaults for a task that has none.
    ///
    /// A backend failure also yields the defaults, but they are not cached.
    pub async fn get_task(&self, task_id: i64) -> TaskSettings {
        match self.try_get_task(task_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => default_for(task_id),
            Err(e) => {
                log::warn!("Failed to load settings for task {}, using defaults: {}", task_id, e);
                metrics::record_storage_error("get_task");
                default_for(task_id)
            }
        }
    }

    /// Validates, normalizes and persists a task's settings.
    ///
    /// Records failing [`validation::validate`] are rejected with every
    /// violation logged.
    pub async fn update_task(&self, task_id: i64, settings: &TaskSettings) -> bool {
        let report = validation::validate(settings);
        if !report.is_valid() {
            for error in report.errors() {
                log::warn!("Rejected settings for task {}: {}", task_id, error);
            }
            return false;
        }

        let mut normalized = validation::normalize(settings);
        normalized.task_id = Some(task_id);

        match self.write_task(task_id, normalized).await {
            Ok(stored) => {
                self.task_cache.write().await.insert(task_id, Some(stored));
                log::info!("Settings updated for task {}", task_id);
                true
            }
            Err(e) => {
                log::error!("Failed to write settings for task {}: {}", task_id, e);
                metrics::record_storage_error("update_task");
                false
            }
        }
    }

    /// Inserts or updates the row, then reads it back so the cached record
    /// carries the stored timestamps.
    async fn write_task(&self, task_id: i64, settings: TaskSettings) -> AppResult<TaskSettings> {
        let params = codec::task_params(task_id, &settings)?;
        let sql = match self.storage.get_task_settings(task_id).await? {
            Some(_) => UPDATE_TASK_SQL,
            None => INSERT_TASK_SQL,
        };
        self.storage.execute_command(sql, params).await?;

        let stored = self.storage.get_task_settings(task_id).await?;
        Ok(stored.map(|row| codec::decode_task_row(&row)).unwrap_or(settings))
    }

    /// Drops a task's stored settings and its cache entry, e.g. once the task
    /// itself is gone. Later reads yield the defaults.
    pub async fn forget_task(&self, task_id: i64) -> bool {
        let result = self
            .storage
            .execute_command(
                "DELETE FROM task_settings WHERE task_id = ?1",
                vec![Value::Integer(task_id)],
            )
            .await;
        // Evicted even on failure; the next read goes back to storage
        self.task_cache.write().await.remove(&task_id);
        match result {
            Ok(removed) => {
                log::debug!("Forgot settings of task {} ({} rows)", task_id, removed);
                true
            }
            Err(e) => {
                log::error!("Failed to delete settings of task {}: {}", task_id, e);
                metrics::record_storage_error("forget_task");
                false
            }
        }
    }

    pub async fn reset_task(&self, task_id: i64) -> bool {
        self.update_task(task_id, &TaskSettings::default()).await
    }

    /// Writes `source`'s settings (identity stripped) as `target`'s settings.
    pub async fn copy_task(&self, source: i64, target: i64) -> bool {
        let settings = match self.try_get_task(source).await {
            Ok(Some(settings)) => settings,
            Ok(None) => default_for(source),
            Err(e) => {
                log::error!("Failed to read settings of task {} for copy: {}", source, e);
                metrics::record_storage_error("copy_task");
                return false;
            }
        };
        self.update_task(target, &settings.without_identity()).await
    }

    pub fn validate(&self, settings: &TaskSettings) -> Validation {
        validation::validate(settings)
    }
}

fn default_for(task_id: i64) -> TaskSettings {
    TaskSettings {
        task_id: Some(task_id),
        ..TaskSettings::default()
    }
}
