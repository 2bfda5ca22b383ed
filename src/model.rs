//! The models describing videos, playlists and their downloadable streams.

use std::collections::HashMap;
use std::fmt;

/// What a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Video track only, needs an audio stream to be merged in.
    VideoOnly,
    /// Audio track only.
    AudioOnly,
    /// Video and audio already combined.
    Progressive,
}

impl StreamKind {
    pub fn has_video(&self) -> bool {
        matches!(self, StreamKind::VideoOnly | StreamKind::Progressive)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::VideoOnly => write!(f, "video-only"),
            StreamKind::AudioOnly => write!(f, "audio-only"),
            StreamKind::Progressive => write!(f, "progressive"),
        }
    }
}

/// One downloadable asset of a video, as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// The provider's identifier for the stream (the itag on YouTube).
    pub id: String,
    pub kind: StreamKind,
    /// The container extension, e.g. `mp4`, `webm`, `m4a`.
    pub extension: String,

    /// The height in pixels, only for streams carrying video.
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<f64>,
    /// The total bitrate in kbps.
    pub bitrate: Option<f64>,
    /// The audio bitrate in kbps.
    pub audio_bitrate: Option<f64>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    /// The exact or approximate size in bytes.
    pub size: Option<u64>,

    /// Where the bytes are served from.
    pub url: String,
    /// Headers the provider requires on the request.
    pub headers: HashMap<String, String>,
}

impl Stream {
    /// Creates a stream with no quality metadata.
    pub fn new(
        id: impl Into<String>,
        kind: StreamKind,
        extension: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            extension: extension.into(),
            height: None,
            width: None,
            fps: None,
            bitrate: None,
            audio_bitrate: None,
            video_codec: None,
            audio_codec: None,
            size: None,
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_bitrate(mut self, kbps: f64) -> Self {
        self.bitrate = Some(kbps);
        self
    }

    pub fn with_audio_bitrate(mut self, kbps: f64) -> Self {
        self.audio_bitrate = Some(kbps);
        self
    }

    /// The bitrate used to rank audio: the audio bitrate when known, the total one otherwise.
    pub fn effective_audio_bitrate(&self) -> f64 {
        self.audio_bitrate.or(self.bitrate).unwrap_or(0.0)
    }

    /// A MIME-like type label, e.g. `video/mp4` or `audio/webm`.
    pub fn mime_type(&self) -> String {
        let major = if self.kind.has_video() { "video" } else { "audio" };
        let minor = match self.extension.as_str() {
            "m4a" => "mp4",
            other => other,
        };
        format!("{}/{}", major, minor)
    }

    /// The resolution as shown to users, e.g. `720p`, or `N/A` for audio.
    pub fn resolution_label(&self) -> String {
        match self.height {
            Some(height) => format!("{}p", height),
            None => "N/A".to_string(),
        }
    }

    pub fn bitrate_label(&self) -> String {
        let kbps = if self.kind == StreamKind::AudioOnly {
            self.audio_bitrate.or(self.bitrate)
        } else {
            self.bitrate
        };

        match kbps {
            Some(kbps) => format!("{}kbps", kbps.round() as u64),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Itag: {} | Type: {} | Resolution: {} | Bitrate: {}",
            self.id,
            self.mime_type(),
            self.resolution_label(),
            self.bitrate_label()
        )
    }
}

/// The streams available for one video, in provider order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamCatalog {
    streams: Vec<Stream>,
}

impl StreamCatalog {
    pub fn new(streams: Vec<Stream>) -> Self {
        Self { streams }
    }

    /// All streams, in the stable order they were reported in.
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn get(&self, index: usize) -> Option<&Stream> {
        self.streams.get(index)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn of_kind(&self, kind: StreamKind) -> impl DoubleEndedIterator<Item = &Stream> {
        self.streams.iter().filter(move |stream| stream.kind == kind)
    }

    /// Streams carrying a video track, progressive or not.
    pub fn with_video(&self) -> impl DoubleEndedIterator<Item = &Stream> {
        self.streams.iter().filter(|stream| stream.kind.has_video())
    }

    pub fn audio_only(&self) -> impl DoubleEndedIterator<Item = &Stream> {
        self.of_kind(StreamKind::AudioOnly)
    }
}

impl FromIterator<Stream> for StreamCatalog {
    fn from_iter<I: IntoIterator<Item = Stream>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A single video and what can be downloaded from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    /// The length in seconds.
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
    pub catalog: StreamCatalog,
}

/// A reference to a video inside a playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
}

/// An ordered list of videos.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// The title used for the playlist folder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled_Playlist",
        }
    }
}
