//! Settings shared by every component, loaded from `config.toml` and overridden by flags.

use crate::error::Result;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "ytgrab";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The root every download is placed under.
    pub output_dir: PathBuf,
    /// The tallest video automatic selection will pick.
    pub max_height: u32,
    /// The AAC bitrate used when muxing, in ffmpeg notation.
    pub audio_bitrate: String,
    /// The audio sample rate used when muxing.
    pub audio_sample_rate: u32,
    /// The container extension of merged files.
    pub merge_extension: String,

    pub ffmpeg: PathBuf,
    pub yt_dlp: PathBuf,
    /// Extra arguments for every yt-dlp lookup, e.g. `["--cookies-from-browser", "firefox"]`
    /// for videos that need a signed-in session.
    pub yt_dlp_args: Vec<String>,
    /// Seconds a yt-dlp lookup may take.
    pub lookup_timeout: u64,
    /// Seconds a single ffmpeg merge may take.
    pub merge_timeout: u64,
    /// Bytes requested per ranged HTTP request.
    pub chunk_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            max_height: 1080,
            audio_bitrate: "128k".to_string(),
            audio_sample_rate: 48000,
            merge_extension: "mp4".to_string(),
            ffmpeg: PathBuf::from("ffmpeg"),
            yt_dlp: PathBuf::from("yt-dlp"),
            yt_dlp_args: Vec::new(),
            lookup_timeout: 120,
            merge_timeout: 60 * 60,
            chunk_size: 10 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Where the settings file lives, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the settings file from the default location.
    ///
    /// A missing file yields the defaults; a malformed one is reported and ignored.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(e) => {
                error!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reads settings from `path`; `Ok(None)` when the file does not exist or is empty.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let settings = toml::from_str::<Settings>(&content)?;
        debug!("Loaded settings from {}", path.display());
        Ok(Some(settings))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout)
    }

    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout)
    }
}
