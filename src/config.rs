use crate::app_dirs::AppDirs;
use crate::content::ClassLevel;
use crate::phonics::{clamp_rate, DEFAULT_RATE};
use crate::practice::{PracticeMode, SessionSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub class_level: ClassLevel,
    pub mode: PracticeMode,
    pub session_size: usize,
    pub playback_rate: f32,
    pub time_limit_secs: Option<u32>,
    pub recognition_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            class_level: ClassLevel::default(),
            mode: PracticeMode::Word,
            session_size: 10,
            playback_rate: DEFAULT_RATE,
            time_limit_secs: None,
            recognition_enabled: true,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            level: Some(cfg.class_level),
            mode: cfg.mode,
            size: cfg.session_size,
            rate: clamp_rate(cfg.playback_rate),
            time_limit_secs: cfg.time_limit_secs,
            recognition_enabled: cfg.recognition_enabled,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("scrawl_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "config_invalid_using_defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
