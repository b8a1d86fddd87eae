use config::{Config, ConfigError, File as ConfigFile};
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

use crate::errors::AppError;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MiscSettings {
    log_level: String,
    pub log_sessions_to_csv: bool,
    pub log_sessions_csv_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BleSettings {
    /// Reconnect to this exact peripheral id when seen, skipping name checks.
    pub saved_address: String,
    /// Reconnect to this exact advertised name.
    pub saved_name: String,
    /// With no saved monitor, connect to the first device whose name starts
    /// with this.
    pub name_prefix: String,
    /// How often the monitor should push status records.
    /// One of "1s", "500ms", "250ms", "100ms".
    pub sample_rate: String,
    /// Subscribe to the single multiplexed characteristic instead of each
    /// record's own. Helps hosts that limit active subscriptions.
    pub use_multiplexed: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DummySettings {
    // When enabled, BLE is disabled
    pub enabled: bool,
    pub stroke_rate: u8,
    pub pace_secs_per_500m: f32,
    pub drag_factor: u8,
    /// Simulate a lost connection after this many strokes. 0 never drops.
    pub strokes_before_dc: u16,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    pub ble: BleSettings,
    pub misc: MiscSettings,
    pub dummy: DummySettings,
}

impl Settings {
    /// Reads the config next to the executable, or from `config_override`.
    /// Missing files are fine unless `required` is set; missing keys fall
    /// back to defaults either way.
    pub fn load(
        config_override: Option<&Path>,
        required: bool,
    ) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match config_override {
            Some(path) => path.to_path_buf(),
            None => {
                let exe_path = env::current_exe().expect("Failed to get executable path");
                exe_path.with_extension("toml")
            }
        };

        let default_log_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        let s = Config::builder()
            .add_source(ConfigFile::from(config_path.clone()).required(required))
            .set_default("ble.saved_address", "")?
            .set_default("ble.saved_name", "")?
            .set_default("ble.name_prefix", "PM5")?
            .set_default("ble.sample_rate", "500ms")?
            .set_default("ble.use_multiplexed", false)?
            .set_default("misc.log_level", default_log_level)?
            .set_default("misc.log_sessions_to_csv", false)?
            .set_default("misc.log_sessions_csv_path", "session_logs")?
            .set_default("dummy.enabled", false)?
            .set_default("dummy.stroke_rate", 24)?
            .set_default("dummy.pace_secs_per_500m", 120.0)?
            .set_default("dummy.drag_factor", 115)?
            .set_default("dummy.strokes_before_dc", 0)?
            .build()?;

        s.try_deserialize().map(|settings| (settings, config_path))
    }

    pub fn save(&self, config_path: &Path) -> Result<(), AppError> {
        let toml_string = toml::to_string(self)?;
        let mut file = File::create(config_path)?;
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.misc.log_level.to_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" => LevelFilter::ERROR,
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("erg-link.toml");
        let (mut settings, _) = Settings::load(Some(&config_path), false).unwrap();
        settings.ble.saved_name = "PM5 430123456".to_owned();
        settings.misc.log_sessions_to_csv = true;
        settings.save(&config_path).unwrap();

        let (loaded, path) = Settings::load(Some(&config_path), true).unwrap();
        assert_eq!(path, config_path);
        assert_eq!(loaded.ble.saved_name, "PM5 430123456");
        assert!(loaded.misc.log_sessions_to_csv);
        assert_eq!(loaded.ble.name_prefix, "PM5");
        assert_eq!(loaded.ble.sample_rate, "500ms");
    }

    #[test]
    fn missing_optional_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");
        let (settings, _) = Settings::load(Some(&config_path), false).unwrap();
        assert_eq!(settings.ble.sample_rate, "500ms");
        assert!(!settings.dummy.enabled);
        assert_eq!(settings.dummy.stroke_rate, 24);
    }

    #[test]
    fn missing_required_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");
        assert!(Settings::load(Some(&config_path), true).is_err());
    }
}
