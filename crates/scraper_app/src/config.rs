use std::fs;
use std::path::Path;

use engine_logging::{engine_info, engine_warn};
use scraper_engine::RunSettings;

/// Loads run settings, falling back to defaults when the file is absent or unreadable.
pub fn load_settings(path: Option<&Path>) -> RunSettings {
    let Some(path) = path else {
        return RunSettings::default();
    };

    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            engine_info!("No settings at {:?}, using defaults", path);
            return RunSettings::default();
        }
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", path, err);
            return RunSettings::default();
        }
    };

    match RunSettings::from_ron(&content) {
        Ok(settings) => {
            engine_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            engine_warn!("Failed to parse settings from {:?}: {}", path, err);
            RunSettings::default()
        }
    }
}
