//! The single-video flow: select, fetch, and merge when the selection is split.

use crate::downloader::Downloader;
use crate::error::Result;
use crate::merger::Merger;
use crate::model::Video;
use crate::selection::{Mode, Selection, SelectionPolicy, StreamChooser};
use crate::utils::{self, FileRole};
use log::{info, warn};
use std::path::{Path, PathBuf};

pub struct VideoPipeline {
    downloader: Downloader,
    merger: Merger,
    policy: SelectionPolicy,
    /// Extension of merged files.
    merge_extension: String,
}

impl VideoPipeline {
    pub fn new(
        downloader: Downloader,
        merger: Merger,
        policy: SelectionPolicy,
        merge_extension: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            merger,
            policy,
            merge_extension: merge_extension.into(),
        }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Selects the stream(s) of `video` for `mode` and downloads them into `dest_dir`.
    ///
    /// Returns the path of the file that is kept.
    pub async fn run(
        &self,
        video: &Video,
        mode: Mode,
        dest_dir: &Path,
        chooser: &dyn StreamChooser,
    ) -> Result<PathBuf> {
        let selection = self.policy.select(&video.catalog, mode, chooser)?;
        self.download(video, &selection, dest_dir).await
    }

    /// Downloads an already made selection.
    pub async fn download(
        &self,
        video: &Video,
        selection: &Selection,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        match selection {
            Selection::Single(stream) => {
                let stem = FileRole::for_kind(stream.kind).stem(&video.title);
                let path = self.downloader.fetch(stream, dest_dir, &stem).await?;
                info!("{} stream saved for: {}", stream.kind, video.title);
                Ok(path)
            }
            Selection::Split { video: picture, audio } => {
                info!("Downloading video-only stream for: {}", video.title);
                let video_path = self
                    .downloader
                    .fetch(picture, dest_dir, &FileRole::Video.stem(&video.title))
                    .await?;

                info!("Downloading audio stream for: {}", video.title);
                let audio_path = match self
                    .downloader
                    .fetch(audio, dest_dir, &FileRole::Audio.stem(&video.title))
                    .await
                {
                    Ok(path) => path,
                    Err(e) => {
                        if let Err(cleanup) = utils::remove_if_exists(&video_path).await {
                            warn!("Failed to remove {}: {}", video_path.display(), cleanup);
                        }
                        return Err(e);
                    }
                };

                let output = dest_dir.join(format!(
                    "{}.{}",
                    FileRole::Final.stem(&video.title),
                    self.merge_extension
                ));
                self.merger.merge(&video_path, &audio_path, &output).await
            }
        }
    }
}
