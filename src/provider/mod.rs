//! Where videos, playlists and stream bytes come from.
//!
//! The rest of the crate only talks to a [`StreamProvider`], so the extraction backend
//! can be swapped, and replaced by an in-memory one in tests.

use crate::error::Result;
use crate::model::{Playlist, Stream, Video};
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use std::path::Path;

pub mod ytdlp;

pub use ytdlp::YtDlpProvider;

#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Looks up a video and lists its streams.
    async fn video(&self, url: &str) -> Result<Video>;

    /// Looks up a playlist and lists its entries in order.
    async fn playlist(&self, url: &str) -> Result<Playlist>;

    /// Writes the bytes of `stream` to `destination`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    async fn fetch(
        &self,
        stream: &Stream,
        destination: &Path,
        progress: &ProgressCallback<'_>,
    ) -> Result<u64>;
}
