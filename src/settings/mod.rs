pub mod store;

pub use store::{JsonFileBackend, Settings, SettingsPatch, SettingsStore};
