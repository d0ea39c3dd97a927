//! Game settings
//!
//! Loaded from an optional JSON file; every field has a default so partial
//! files work. Command-line flags are layered on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{INITIAL_CHUNKS, REFILL_INTERVAL, RENDER_INTERVAL, ROAD_CHUNK_SIZE};
use crate::error::ConfigError;

/// Generation service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Chat-completions base URL (`/chat/completions` is appended)
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Output budget per requested line
    pub tokens_per_line: u32,
    /// Global request timeout
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "qwen/qwen3-32b".to_string(),
            temperature: 0.7,
            tokens_per_line: 15,
            timeout_secs: 20,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

impl ServiceSettings {
    /// API key from the configured environment variable (blank counts as unset)
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Track buffer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    /// Lines per generation call
    pub chunk_size: usize,
    /// Chunks generated before the race starts
    pub initial_chunks: usize,
    /// Background refill check period
    pub refill_interval_ms: u64,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            chunk_size: ROAD_CHUNK_SIZE,
            initial_chunks: INITIAL_CHUNKS,
            refill_interval_ms: REFILL_INTERVAL.as_millis() as u64,
        }
    }
}

impl TrackSettings {
    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms.max(1))
    }
}

/// Where [`Settings::load_or_default`] found its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    File,
    Defaults,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub track: TrackSettings,

    /// Main loop render/poll period
    pub render_interval_ms: u64,
    /// RNG seed (None = derive from the system clock)
    pub seed: Option<u64>,
    /// Run without the generation service
    pub offline: bool,

    /// Log destination (stderr belongs to the game screen)
    pub log_file: PathBuf,
    pub high_scores_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            track: TrackSettings::default(),
            render_interval_ms: RENDER_INTERVAL.as_millis() as u64,
            seed: None,
            offline: false,
            log_file: PathBuf::from("token-racer.log"),
            high_scores_file: PathBuf::from("token-racer-scores.json"),
        }
    }
}

impl Settings {
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load settings, falling back to defaults when the file is missing.
    /// Runs before the logger exists, so the caller reports where they came from.
    pub fn load_or_default(path: &Path) -> Result<(Self, SettingsSource), ConfigError> {
        if !path.exists() {
            return Ok((Self::default(), SettingsSource::Defaults));
        }
        Ok((Self::load(path)?, SettingsSource::File))
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Seed to use for this run
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x70CE_4ACE)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("token-racer-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"seed": 42, "track": {"chunk_size": 12}}"#).unwrap();
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.track.chunk_size, 12);
        assert_eq!(settings.track.initial_chunks, INITIAL_CHUNKS);
        assert_eq!(settings.service, ServiceSettings::default());
    }

    #[test]
    fn test_save_load_file() {
        let path = temp_path("settings.json");
        let mut settings = Settings::default();
        settings.offline = true;
        settings.service.model = "local/test".into();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_existing_file_is_reported_as_source() {
        let path = temp_path("source.json");
        let settings = Settings {
            seed: Some(9),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let (loaded, source) = Settings::load_or_default(&path).unwrap();
        assert_eq!(source, SettingsSource::File);
        assert_eq!(loaded.seed, Some(9));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_defaults() {
        let path = temp_path("missing.json");
        assert_eq!(
            Settings::load_or_default(&path).unwrap(),
            (Settings::default(), SettingsSource::Defaults)
        );
        assert!(matches!(Settings::load(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let path = temp_path("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_effective_seed_prefers_configured() {
        let settings = Settings {
            seed: Some(7),
            ..Settings::default()
        };
        assert_eq!(settings.effective_seed(), 7);
    }
}
