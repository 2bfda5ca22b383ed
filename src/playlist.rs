//! Downloading every video of a playlist, one after the other.

use crate::error::{Error, Result};
use crate::model::Playlist;
use crate::pipeline::VideoPipeline;
use crate::provider::StreamProvider;
use crate::selection::{Mode, Unattended};
use crate::utils;
use log::{error, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What is kept of each playlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistMode {
    Audio,
    Video,
}

impl PlaylistMode {
    /// The folder the outputs land in under the playlist folder.
    pub fn subfolder(&self) -> &'static str {
        match self {
            PlaylistMode::Audio => "audio",
            PlaylistMode::Video => "video",
        }
    }

    pub fn selection_mode(&self) -> Mode {
        match self {
            PlaylistMode::Audio => Mode::AutoAudio,
            PlaylistMode::Video => Mode::AutoVideo,
        }
    }
}

impl fmt::Display for PlaylistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subfolder())
    }
}

/// An entry that could not be downloaded.
#[derive(Debug)]
pub struct EntryFailure {
    /// 1-based position in the playlist.
    pub position: usize,
    pub url: String,
    pub error: Error,
}

/// What happened to each entry of a playlist run.
#[derive(Debug, Default)]
pub struct PlaylistReport {
    pub total: usize,
    pub completed: Vec<PathBuf>,
    pub failed: Vec<EntryFailure>,
}

impl PlaylistReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct PlaylistOrchestrator {
    provider: Arc<dyn StreamProvider>,
    pipeline: Arc<VideoPipeline>,
}

impl PlaylistOrchestrator {
    pub fn new(provider: Arc<dyn StreamProvider>, pipeline: Arc<VideoPipeline>) -> Self {
        Self { provider, pipeline }
    }

    /// The folder a playlist's outputs land in for `mode`.
    pub fn destination(playlist: &Playlist, mode: PlaylistMode, base_dir: &Path) -> PathBuf {
        utils::playlist_dir(base_dir, playlist.display_title(), mode.subfolder())
    }

    /// Downloads every entry in order. A failing entry is logged and skipped.
    pub async fn run(
        &self,
        playlist: &Playlist,
        mode: PlaylistMode,
        base_dir: &Path,
    ) -> PlaylistReport {
        let dest_dir = Self::destination(playlist, mode, base_dir);
        let total = playlist.entries.len();

        info!("Playlist Title: {}", playlist.display_title());
        info!("Total Videos: {}", total);

        let mut report = PlaylistReport {
            total,
            ..PlaylistReport::default()
        };

        for (index, entry) in playlist.entries.iter().enumerate() {
            let position = index + 1;
            info!("--- Video {}/{} ---", position, total);

            match self.download_entry(&entry.url, mode, &dest_dir).await {
                Ok(path) => report.completed.push(path),
                Err(e) => {
                    error!("Skipping video {} ({}): {}", position, entry.url, e);
                    report.failed.push(EntryFailure {
                        position,
                        url: entry.url.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "Playlist done: {} of {} videos downloaded",
            report.completed.len(),
            total
        );
        report
    }

    async fn download_entry(&self, url: &str, mode: PlaylistMode, dest_dir: &Path) -> Result<PathBuf> {
        let video = self.provider.video(url).await?;
        info!("Title: {}", video.title);

        self.pipeline
            .run(&video, mode.selection_mode(), dest_dir, &Unattended)
            .await
    }
}
