use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: relaygram.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "relaygram.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: relaygram.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "relaygram.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Routing configuration
pub mod routing {
    use super::Duration;

    /// Resolutions slower than this are logged as slow routes (milliseconds)
    pub const SLOW_ROUTE_THRESHOLD_MS: u64 = 100;

    /// Slow route threshold duration
    pub fn slow_route_threshold() -> Duration {
        Duration::from_millis(SLOW_ROUTE_THRESHOLD_MS)
    }

    /// Identifiers resolved eagerly when the task router is built
    pub const COMMON_ROUTES: &[&str] = &[
        "task_list",
        "task_create",
        "task_refresh",
        "task_view_1",
        "task_settings_1",
        "task_edit_1",
    ];

    /// Tasks shown per page in the task list
    pub const TASKS_PER_PAGE: usize = 10;
}

/// Task settings limits
pub mod limits {
    /// Upper bound for `delay_max` (seconds)
    pub const MAX_DELAY_SECS: i64 = 300;

    /// Telegram's message length ceiling
    pub const MAX_MESSAGE_LENGTH: i64 = 4096;

    /// Telegram's caption length ceiling (characters)
    pub const MAX_CAPTION_CHARS: usize = 1024;

    pub const MAX_KEYWORD_FILTERS: usize = 100;

    pub const MAX_REPLACEMENTS: usize = 50;
}

/// Settings preset storage
pub mod presets {
    /// System setting key holding the whole preset map
    pub const PRESETS_KEY: &str = "settings_presets";

    /// Description stored alongside the preset map
    pub const PRESETS_DESCRIPTION: &str = "Task settings presets";

    /// Compare-and-set attempts before a preset write gives up
    pub const MAX_WRITE_ATTEMPTS: u32 = 3;
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub(crate) fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Whether the given Telegram user may manage tasks.
    /// With no ADMIN_IDS configured every user is allowed.
    pub fn is_admin(user_id: i64) -> bool {
        ADMIN_IDS.is_empty() || ADMIN_IDS.contains(&user_id)
    }
}
