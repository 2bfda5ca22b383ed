//! A provider backed by the `yt-dlp` executable.
//!
//! Metadata comes from `yt-dlp -J`, which prints the video (or playlist) as JSON.
//! The bytes themselves are fetched directly over HTTP from the URLs it reports.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::fetcher::Fetcher;
use crate::model::{Playlist, PlaylistEntry, Stream, StreamCatalog, StreamKind, Video};
use crate::progress::ProgressCallback;
use crate::provider::StreamProvider;
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Represents a video as printed by `yt-dlp -J`. Only the fields used here are kept.
#[derive(Debug, Clone, Deserialize)]
struct VideoInfo {
    id: String,
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<FormatInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct FormatInfo {
    format_id: String,
    url: Option<String>,
    ext: String,
    protocol: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
    /// Total bitrate in kbps.
    tbr: Option<f64>,
    /// Audio bitrate in kbps.
    abr: Option<f64>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// Represents a playlist as printed by `yt-dlp --flat-playlist -J`.
#[derive(Debug, Clone, Deserialize)]
struct PlaylistInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: String,
    title: Option<String>,
    #[serde(default)]
    entries: Vec<Option<EntryInfo>>,
}

#[derive(Debug, Clone, Deserialize)]
struct EntryInfo {
    id: String,
    url: Option<String>,
    title: Option<String>,
}

fn codec_present(codec: &Option<String>) -> Option<bool> {
    codec.as_deref().map(|codec| codec != "none")
}

impl FormatInfo {
    fn kind(&self) -> Option<StreamKind> {
        match (codec_present(&self.vcodec), codec_present(&self.acodec)) {
            (Some(true), Some(true)) | (None, None) => Some(StreamKind::Progressive),
            (Some(true), _) => Some(StreamKind::VideoOnly),
            (_, Some(true)) => Some(StreamKind::AudioOnly),
            _ => None,
        }
    }

    fn is_plain_http(&self) -> bool {
        matches!(self.protocol.as_deref(), None | Some("http") | Some("https"))
    }

    /// Converts the format into a stream, skipping manifests, storyboards and URL-less formats.
    fn into_stream(self) -> Option<Stream> {
        if !self.is_plain_http() {
            return None;
        }
        let kind = self.kind()?;
        let url = self.url?;

        let height = if kind.has_video() { self.height } else { None };
        let audio_bitrate = match kind {
            StreamKind::AudioOnly => self.abr.or(self.tbr),
            StreamKind::Progressive => self.abr,
            StreamKind::VideoOnly => None,
        };

        Some(Stream {
            id: self.format_id,
            kind,
            extension: self.ext,
            height,
            width: self.width,
            fps: self.fps,
            bitrate: self.tbr,
            audio_bitrate,
            video_codec: self.vcodec.filter(|codec| codec != "none"),
            audio_codec: self.acodec.filter(|codec| codec != "none"),
            size: self.filesize.or(self.filesize_approx),
            url,
            headers: self.http_headers,
        })
    }
}

/// Parses the output of `yt-dlp -J` for a single video.
fn parse_video(json: &str, requested_url: &str) -> Result<Video> {
    let info: VideoInfo = serde_json::from_str(json)?;

    let catalog: StreamCatalog = info
        .formats
        .into_iter()
        .filter_map(FormatInfo::into_stream)
        .collect();
    debug!("Video {} has {} downloadable streams", info.id, catalog.len());

    Ok(Video {
        url: info
            .webpage_url
            .unwrap_or_else(|| requested_url.to_string()),
        id: info.id,
        title: info.title,
        author: info.channel.or(info.uploader),
        duration: info.duration.map(|seconds| seconds.round() as u64),
        view_count: info.view_count,
        catalog,
    })
}

/// Parses the output of `yt-dlp --flat-playlist -J`.
fn parse_playlist(json: &str, requested_url: &str) -> Result<Playlist> {
    let info: PlaylistInfo = serde_json::from_str(json)?;

    if info.kind.as_deref() != Some("playlist") {
        return Err(Error::InvalidUserInput(format!(
            "{} is not a playlist",
            requested_url
        )));
    }

    let entries = info
        .entries
        .into_iter()
        .flatten()
        .map(|entry| PlaylistEntry {
            url: entry
                .url
                .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id)),
            id: entry.id,
            title: entry.title,
        })
        .collect();

    Ok(Playlist {
        id: info.id,
        url: requested_url.to_string(),
        title: info.title,
        entries,
    })
}

/// Lists streams through `yt-dlp` and fetches them with [`Fetcher`].
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    /// The path to the `yt-dlp` executable.
    executable: PathBuf,
    /// The timeout of a single lookup.
    timeout: Duration,
    /// Bytes per ranged request when fetching.
    chunk_size: u64,
    /// Extra arguments passed to every lookup.
    args: Vec<String>,
}

impl YtDlpProvider {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
            chunk_size: Settings::default().chunk_size,
            args: Vec::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        settings.yt_dlp_args.iter().fold(
            Self::new(&settings.yt_dlp, settings.lookup_timeout()).with_chunk_size(settings.chunk_size),
            |provider, arg| provider.with_arg(arg),
        )
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Adds an argument passed to every `yt-dlp` lookup, e.g. `--cookies-from-browser`.
    pub fn with_arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    fn lookup_args(&self, flag: &str, url: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(
            ["--no-progress", "--no-warnings", flag, "-J", url]
                .iter()
                .map(|arg| arg.to_string()),
        );
        args
    }

    async fn dump_json(&self, flag: &str, url: &str) -> Result<String> {
        let executor = Executor {
            executable_path: self.executable.clone(),
            timeout: self.timeout,
            args: self.lookup_args(flag, url),
        };

        let output = executor
            .execute()
            .await
            .map_err(|e| Error::fetch(url, format!("{} lookup failed: {}", self.name(), e)))?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl StreamProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn video(&self, url: &str) -> Result<Video> {
        info!("Looking up video {}", url);
        let json = self.dump_json("--no-playlist", url).await?;
        parse_video(&json, url).map_err(|e| Error::fetch(url, e))
    }

    async fn playlist(&self, url: &str) -> Result<Playlist> {
        info!("Looking up playlist {}", url);
        let json = self.dump_json("--flat-playlist", url).await?;
        match parse_playlist(&json, url) {
            Err(Error::Serde(e)) => Err(Error::fetch(url, e)),
            other => other,
        }
    }

    async fn fetch(
        &self,
        stream: &Stream,
        destination: &Path,
        progress: &ProgressCallback<'_>,
    ) -> Result<u64> {
        Fetcher::new(&stream.url)
            .with_headers(&stream.headers)
            .with_chunk_size(self.chunk_size)
            .fetch_to(destination, progress)
            .await
    }
}
