use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    #[serde(default = "default_portrait_video")]
    pub tiles_per_page_portrait_video: u32,
    #[serde(default = "default_portrait_audio")]
    pub tiles_per_page_portrait_audio: u32,
    #[serde(default = "default_landscape")]
    pub tiles_per_page_landscape: u32,
    /// Remove screen-share and plugin tiles when their track ends instead
    /// of leaving an empty placeholder.
    #[serde(default)]
    pub drop_auxiliary_tiles: bool,
}

fn default_portrait_video() -> u32 {
    4
}

fn default_portrait_audio() -> u32 {
    6
}

fn default_landscape() -> u32 {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tiles_per_page_portrait_video: default_portrait_video(),
            tiles_per_page_portrait_audio: default_portrait_audio(),
            tiles_per_page_landscape: default_landscape(),
            drop_auxiliary_tiles: false,
        }
    }
}

pub struct SettingsStore {
    settings: Mutex<Settings>,
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join("settings.json");
        let settings = Self::load(&file_path);
        Self {
            settings: Mutex::new(settings),
            file_path,
        }
    }

    pub fn get(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    pub fn set_tiles_per_page_portrait_video(&self, count: u32) {
        self.settings.lock().unwrap().tiles_per_page_portrait_video = count;
        self.save();
    }

    pub fn set_tiles_per_page_portrait_audio(&self, count: u32) {
        self.settings.lock().unwrap().tiles_per_page_portrait_audio = count;
        self.save();
    }

    pub fn set_tiles_per_page_landscape(&self, count: u32) {
        self.settings.lock().unwrap().tiles_per_page_landscape = count;
        self.save();
    }

    pub fn set_drop_auxiliary_tiles(&self, enabled: bool) {
        self.settings.lock().unwrap().drop_auxiliary_tiles = enabled;
        self.save();
    }

    fn save(&self) {
        let settings = self.settings.lock().unwrap().clone();
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&settings) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.file_path, json) {
                    tracing::warn!("failed to write {}: {e}", self.file_path.display());
                }
            }
            Err(e) => tracing::warn!("failed to serialize settings: {e}"),
        }
    }

    fn load(path: &PathBuf) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring corrupt settings file: {e}");
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert_eq!(s.tiles_per_page_portrait_video, 4);
        assert_eq!(s.tiles_per_page_portrait_audio, 6);
        assert_eq!(s.tiles_per_page_landscape, 2);
        assert!(!s.drop_auxiliary_tiles);
    }

    #[test]
    fn test_new_creates_defaults_when_no_file() {
        let dir = temp_dir();
        let store = SettingsStore::new(dir.path().to_str().unwrap());
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_page_sizes_persist() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        {
            let store = SettingsStore::new(path);
            store.set_tiles_per_page_portrait_video(9);
            store.set_tiles_per_page_portrait_audio(12);
            store.set_tiles_per_page_landscape(3);
        }
        let s = SettingsStore::new(path).get();
        assert_eq!(s.tiles_per_page_portrait_video, 9);
        assert_eq!(s.tiles_per_page_portrait_audio, 12);
        assert_eq!(s.tiles_per_page_landscape, 3);
    }

    #[test]
    fn test_drop_auxiliary_tiles_persists() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        {
            let store = SettingsStore::new(path);
            store.set_drop_auxiliary_tiles(true);
        }
        assert!(SettingsStore::new(path).get().drop_auxiliary_tiles);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        fs::write(dir.path().join("settings.json"), "not json!!!").unwrap();
        let store = SettingsStore::new(path);
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_partial_json_uses_serde_defaults() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"tiles_per_page_landscape":1}"#,
        )
        .unwrap();
        let s = SettingsStore::new(path).get();
        assert_eq!(s.tiles_per_page_landscape, 1);
        assert_eq!(s.tiles_per_page_portrait_video, 4);
        assert_eq!(s.tiles_per_page_portrait_audio, 6);
    }
}
