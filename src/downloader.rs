//! Fetching a chosen stream into a destination folder.

use crate::error::{Error, Result};
use crate::model::Stream;
use crate::progress::Progress;
use crate::provider::StreamProvider;
use crate::utils;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Downloader {
    provider: Arc<dyn StreamProvider>,
    progress: Option<Progress>,
}

impl Downloader {
    pub fn new(provider: Arc<dyn StreamProvider>) -> Self {
        Self {
            provider,
            progress: None,
        }
    }

    /// Draws a progress bar for every fetch.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetches `stream` into `<dest_dir>/<file_stem>.<extension>` and returns that path.
    ///
    /// The folder is created when missing and an existing file is overwritten.
    /// On failure, whatever was written is removed.
    pub async fn fetch(&self, stream: &Stream, dest_dir: &Path, file_stem: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let destination = dest_dir.join(format!("{}.{}", file_stem, stream.extension));

        info!(
            "Downloading {} stream {} to {}",
            stream.kind,
            stream.id,
            destination.display()
        );

        let transfer = self
            .progress
            .as_ref()
            .map(|progress| progress.transfer(file_stem, stream.size));
        let report = |done: u64, total: Option<u64>| {
            if let Some(transfer) = &transfer {
                transfer.update(done, total);
            }
        };

        match self.provider.fetch(stream, &destination, &report).await {
            Ok(bytes) => {
                if let Some(transfer) = &transfer {
                    transfer.finish();
                }
                info!("Downloaded {} bytes to {}", bytes, destination.display());
                Ok(destination)
            }
            Err(e) => {
                if let Some(transfer) = &transfer {
                    transfer.abandon();
                }
                if let Err(cleanup) = utils::remove_if_exists(&destination).await {
                    warn!(
                        "Failed to remove partial file {}: {}",
                        destination.display(),
                        cleanup
                    );
                }

                Err(match e {
                    Error::Fetch { .. } => e,
                    other => Error::fetch(format!("stream {}", stream.id), other),
                })
            }
        }
    }
}
