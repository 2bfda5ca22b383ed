#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use ytgrab::Ytgrab;
use ytgrab::config::Settings;
use ytgrab::error::{Error, Result};
use ytgrab::merger::Muxer;
use ytgrab::model::{Playlist, PlaylistEntry, Stream, StreamCatalog, StreamKind, Video};
use ytgrab::progress::{Progress, ProgressCallback};
use ytgrab::provider::StreamProvider;

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

pub fn video_only(id: &str, height: u32, kbps: f64) -> Stream {
    Stream::new(id, StreamKind::VideoOnly, "mp4", format!("https://cdn.test/{}", id))
        .with_height(height)
        .with_bitrate(kbps)
}

pub fn audio_only(id: &str, kbps: f64) -> Stream {
    Stream::new(id, StreamKind::AudioOnly, "m4a", format!("https://cdn.test/{}", id))
        .with_audio_bitrate(kbps)
}

pub fn progressive(id: &str, height: u32) -> Stream {
    Stream::new(id, StreamKind::Progressive, "mp4", format!("https://cdn.test/{}", id))
        .with_height(height)
        .with_bitrate(900.0)
        .with_audio_bitrate(128.0)
}

/// A video whose stream URLs are unique to it, so single fetches can be failed.
pub fn video(id: &str, title: &str, streams: Vec<Stream>) -> Video {
    let streams = streams
        .into_iter()
        .map(|mut stream| {
            stream.url = format!("{}/{}", stream.url, id);
            stream
        })
        .collect();

    Video {
        id: id.to_string(),
        url: watch_url(id),
        title: title.to_string(),
        author: Some("Tester".to_string()),
        duration: Some(90),
        view_count: Some(42),
        catalog: StreamCatalog::new(streams),
    }
}

/// The usual split catalog: video-only streams up to 1440p and two audio streams.
pub fn split_video(id: &str, title: &str) -> Video {
    video(
        id,
        title,
        vec![
            video_only("137", 1080, 4400.0),
            video_only("400", 1440, 9000.0),
            audio_only("140", 129.0),
            audio_only("251", 160.0),
        ],
    )
}

/// Serves videos from memory and writes each stream's id as its bytes.
#[derive(Default)]
pub struct MockProvider {
    videos: HashMap<String, Video>,
    playlists: HashMap<String, Playlist>,
    failing_streams: HashSet<String>,
    pub lookups: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl MockProvider {
    pub fn with_video(mut self, video: Video) -> Self {
        self.videos.insert(video.url.clone(), video);
        self
    }

    /// Adds a playlist whose entries are the given videos, which become resolvable too.
    pub fn with_playlist(mut self, url: &str, title: Option<&str>, videos: Vec<Video>) -> Self {
        let entries = videos
            .iter()
            .map(|video| PlaylistEntry {
                id: video.id.clone(),
                url: video.url.clone(),
                title: Some(video.title.clone()),
            })
            .collect();
        self.playlists.insert(
            url.to_string(),
            Playlist {
                id: "PLtest".to_string(),
                url: url.to_string(),
                title: title.map(str::to_string),
                entries,
            },
        );
        for video in videos {
            self = self.with_video(video);
        }
        self
    }

    /// Makes a video unresolvable, as if it was deleted after being listed.
    pub fn without_video(mut self, url: &str) -> Self {
        self.videos.remove(url);
        self
    }

    /// Makes fetching `stream` of `video_id` fail halfway.
    pub fn failing(mut self, stream: &str, video_id: &str) -> Self {
        self.failing_streams
            .insert(format!("https://cdn.test/{}/{}", stream, video_id));
        self
    }
}

#[async_trait]
impl StreamProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn video(&self, url: &str) -> Result<Video> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.videos
            .get(url)
            .cloned()
            .ok_or_else(|| Error::fetch(url, "Video unavailable"))
    }

    async fn playlist(&self, url: &str) -> Result<Playlist> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.playlists
            .get(url)
            .cloned()
            .ok_or_else(|| Error::fetch(url, "Playlist does not exist"))
    }

    async fn fetch(
        &self,
        stream: &Stream,
        destination: &Path,
        progress: &ProgressCallback<'_>,
    ) -> Result<u64> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let body = stream.id.as_bytes();

        if self.failing_streams.contains(&stream.url) {
            tokio::fs::write(destination, &body[..body.len() / 2]).await?;
            return Err(Error::fetch(&stream.url, "connection reset"));
        }

        tokio::fs::write(destination, body).await?;
        progress(body.len() as u64, Some(body.len() as u64));
        Ok(body.len() as u64)
    }
}

/// Writes the two inputs' contents into the output, or fails without output.
#[derive(Default)]
pub struct MockMuxer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockMuxer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Muxer for MockMuxer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Command("Process failed with code 1: Invalid data".to_string()));
        }

        let mut merged = tokio::fs::read(video).await?;
        merged.extend(tokio::fs::read(audio).await?);
        tokio::fs::write(output, merged).await?;
        Ok(())
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub provider: Arc<MockProvider>,
    pub muxer: Arc<MockMuxer>,
    pub app: Ytgrab,
}

pub fn harness(provider: MockProvider, muxer: MockMuxer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        output_dir: dir.path().join("downloads"),
        ..Settings::default()
    };
    let provider = Arc::new(provider);
    let muxer = Arc::new(muxer);
    let app = Ytgrab::with_components(settings, provider.clone(), muxer.clone(), Progress::hidden());

    Harness {
        dir,
        provider,
        muxer,
        app,
    }
}

/// File names in `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
