//! System and per-task settings with caching, validation and presets

mod codec;
pub mod model;
mod presets;
pub mod render;
pub mod store;
pub mod validation;

pub use model::{ForwardMode, SettingToggle, SettingValue, SettingsPreset, SystemSetting, TaskSettings, ValueType};
pub use store::SettingsStore;
pub use validation::{normalize, validate, Validation};
