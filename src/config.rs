//! Application settings
//!
//! Settings are stored as JSON at `~/.sesnot/config.json` with a
//! schema version for forward migrations. Unknown or missing fields
//! fall back to defaults via `#[serde(default)]`, so older config
//! files keep working after upgrades.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

const CONFIG_FILE_NAME: &str = "config.json";

/// Settings errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDirectory,

    #[error("Failed to read or write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialise settings: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Main settings structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Schema version for migrations
    pub version: u32,
    /// Speech recognition settings
    pub speech: SpeechSettings,
    /// Note storage settings
    pub notes: NotesSettings,
    /// Spoken feedback settings
    pub feedback: FeedbackSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            speech: SpeechSettings::default(),
            notes: NotesSettings::default(),
            feedback: FeedbackSettings::default(),
        }
    }
}

/// Speech recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Active interface/recognition language
    pub language: Language,
    /// Keep the recognition session open across utterances
    pub continuous: bool,
    /// Deliver provisional results before the utterance settles
    pub interim_results: bool,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// Note storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesSettings {
    /// Override for the data directory (None for ~/.sesnot)
    pub data_dir: Option<PathBuf>,
    /// Storage cap for the notes database, in megabytes
    pub max_storage_mb: u64,
}

impl Default for NotesSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_storage_mb: 512,
        }
    }
}

/// Spoken feedback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// Speak confirmations after each executed command
    pub speak_confirmations: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            speak_confirmations: true,
        }
    }
}

/// Returns the default data directory (~/.sesnot).
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(".sesnot"))
}

/// Loads and saves settings at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location (~/.sesnot/config.json).
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(default_data_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields defaults; an unreadable
    /// file is logged and replaced with defaults rather than failing
    /// startup.
    pub fn load(&self) -> AppSettings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {:?}, using defaults", self.path);
                return AppSettings::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read settings, using defaults: {}", e);
                return AppSettings::default();
            }
        };

        match serde_json::from_str::<AppSettings>(&contents) {
            Ok(mut settings) => {
                if settings.version < CURRENT_VERSION {
                    tracing::info!(
                        from = settings.version,
                        to = CURRENT_VERSION,
                        "Migrating settings schema"
                    );
                    settings.version = CURRENT_VERSION;
                }
                settings
            }
            Err(e) => {
                tracing::warn!("Settings file corrupt, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Write settings to disk, creating parent directories as needed.
    pub fn save(&self, settings: &AppSettings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        tracing::debug!("Settings saved to {:?}", self.path);
        Ok(())
    }
}
