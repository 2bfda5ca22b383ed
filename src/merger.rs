//! Combining a video-only file and an audio-only file into one container.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::utils;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Something that can mux a video file and an audio file into `output`.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Name of the muxer (for logging)
    fn name(&self) -> &'static str;

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;
}

/// Muxes with an `ffmpeg` process: the video is copied, the audio re-encoded to AAC.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    /// The path to the `ffmpeg` executable.
    executable: PathBuf,
    /// The AAC bitrate, e.g. `128k`.
    audio_bitrate: String,
    audio_sample_rate: u32,
    timeout: Duration,
}

impl FfmpegMuxer {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        let defaults = Settings::default();
        Self {
            executable: executable.into(),
            audio_bitrate: defaults.audio_bitrate,
            audio_sample_rate: defaults.audio_sample_rate,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            executable: settings.ffmpeg.clone(),
            audio_bitrate: settings.audio_bitrate.clone(),
            audio_sample_rate: settings.audio_sample_rate,
            timeout: settings.merge_timeout(),
        }
    }

    /// The arguments of the merge command.
    pub fn args(&self, video: &Path, audio: &Path, output: &Path) -> Result<Vec<String>> {
        let video = video
            .to_str()
            .ok_or(Error::Path("Invalid video path".to_string()))?;
        let audio = audio
            .to_str()
            .ok_or(Error::Path("Invalid audio path".to_string()))?;
        let output = output
            .to_str()
            .ok_or(Error::Path("Invalid output path".to_string()))?;
        let sample_rate = self.audio_sample_rate.to_string();

        let args = [
            "-y",
            "-loglevel",
            "error",
            "-i",
            video,
            "-i",
            audio,
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-b:a",
            self.audio_bitrate.as_str(),
            "-ar",
            sample_rate.as_str(),
            output,
        ];

        Ok(args.iter().map(|arg| arg.to_string()).collect())
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        let executor = Executor {
            executable_path: self.executable.clone(),
            timeout: self.timeout,
            args: self.args(video, audio, output)?,
        };

        executor.execute().await?;
        Ok(())
    }
}

/// Runs a [`Muxer`] and takes care of the files around it.
#[derive(Clone)]
pub struct Merger {
    muxer: Arc<dyn Muxer>,
}

impl Merger {
    pub fn new(muxer: Arc<dyn Muxer>) -> Self {
        Self { muxer }
    }

    /// Muxes `video` and `audio` into `output` and returns `output`.
    ///
    /// On success both inputs are deleted. On failure the inputs are left in place and
    /// nothing is left at `output`.
    pub async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf> {
        info!(
            "Merging {} and {} into {} with {}",
            video.display(),
            audio.display(),
            output.display(),
            self.muxer.name()
        );

        let reason = match self.muxer.mux(video, audio, output).await {
            Ok(()) if tokio::fs::try_exists(output).await.unwrap_or(false) => None,
            Ok(()) => Some(format!("{} produced no output file", self.muxer.name())),
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = reason {
            if let Err(e) = utils::remove_if_exists(output).await {
                warn!("Failed to remove partial output {}: {}", output.display(), e);
            }
            return Err(Error::merge(output, reason));
        }

        for input in [video, audio] {
            match tokio::fs::remove_file(input).await {
                Ok(()) => debug!("Removed intermediate file {}", input.display()),
                Err(e) => warn!("Failed to remove intermediate file {}: {}", input.display(), e),
            }
        }

        info!("Merging complete: {}", output.display());
        Ok(output.to_path_buf())
    }
}
