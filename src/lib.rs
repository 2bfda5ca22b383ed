use {
    crate::config::Settings,
    crate::downloader::Downloader,
    crate::error::{Error, Result},
    crate::merger::{FfmpegMuxer, Merger, Muxer},
    crate::model::{Playlist, Video},
    crate::pipeline::VideoPipeline,
    crate::playlist::{PlaylistMode, PlaylistOrchestrator, PlaylistReport},
    crate::progress::Progress,
    crate::provider::{StreamProvider, YtDlpProvider},
    crate::selection::{Mode, SelectionPolicy, StreamChooser},
    log::info,
    regex::Regex,
    std::path::PathBuf,
    std::sync::Arc,
};

pub mod config;
pub mod downloader;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod menu;
pub mod merger;
pub mod model;
pub mod pipeline;
pub mod playlist;
pub mod progress;
pub mod provider;
pub mod selection;
pub mod utils;

const YOUTUBE_PATTERNS: [&str; 3] = [
    r"^https?://(www\.|m\.|music\.)?youtube\.com/(watch\?|playlist\?|shorts/|live/|embed/).+",
    r"^https?://youtu\.be/[\w-]+",
    r"^https?://(www\.)?youtube-nocookie\.com/embed/.+",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Video,
    Playlist,
}

/// Tells whether `url` points at a YouTube video or playlist; `None` when it is neither.
pub fn classify_url(url: &str) -> Result<Option<UrlKind>> {
    let url = url.trim();
    for pattern in YOUTUBE_PATTERNS.iter() {
        let re = Regex::new(pattern)?;
        if re.is_match(url) {
            if url.contains("/playlist?") {
                return Ok(Some(UrlKind::Playlist));
            }
            return Ok(Some(UrlKind::Video));
        }
    }
    Ok(None)
}

fn expect_url(url: &str, kind: UrlKind) -> Result<()> {
    let found = classify_url(url)?.ok_or_else(|| {
        Error::InvalidUserInput(format!("{} is not a YouTube URL", url.trim()))
    })?;

    // a watch URL inside a playlist can be fetched either way
    let accepted = match kind {
        UrlKind::Video => found == UrlKind::Video,
        UrlKind::Playlist => found == UrlKind::Playlist || url.contains("list="),
    };
    if !accepted {
        return Err(Error::InvalidUserInput(format!(
            "{} is a {:?} URL, not a {:?} URL",
            url.trim(),
            found,
            kind
        )));
    }
    Ok(())
}

/// Everything needed to look up and download videos and playlists.
pub struct Ytgrab {
    settings: Settings,
    provider: Arc<dyn StreamProvider>,
    pipeline: Arc<VideoPipeline>,
    playlists: PlaylistOrchestrator,
}

impl Ytgrab {
    /// Wires `yt-dlp` and `ffmpeg` as configured in `settings`.
    pub fn new(settings: Settings, progress: Progress) -> Self {
        let provider = Arc::new(YtDlpProvider::from_settings(&settings));
        let muxer = Arc::new(FfmpegMuxer::from_settings(&settings));
        Self::with_components(settings, provider, muxer, progress)
    }

    pub fn with_components(
        settings: Settings,
        provider: Arc<dyn StreamProvider>,
        muxer: Arc<dyn Muxer>,
        progress: Progress,
    ) -> Self {
        let downloader = Downloader::new(provider.clone()).with_progress(progress);
        let pipeline = Arc::new(VideoPipeline::new(
            downloader,
            Merger::new(muxer),
            SelectionPolicy::new(settings.max_height),
            settings.merge_extension.clone(),
        ));
        let playlists = PlaylistOrchestrator::new(provider.clone(), pipeline.clone());

        Self {
            settings,
            provider,
            pipeline,
            playlists,
        }
    }

    /// The tallest video automatic selection picks.
    pub fn max_height(&self) -> u32 {
        self.pipeline.policy().max_height()
    }

    pub async fn lookup_video(&self, url: &str) -> Result<Video> {
        expect_url(url, UrlKind::Video)?;
        self.provider.video(url.trim()).await
    }

    pub async fn lookup_playlist(&self, url: &str) -> Result<Playlist> {
        expect_url(url, UrlKind::Playlist)?;
        self.provider.playlist(url.trim()).await
    }

    /// Where a single video's files are written.
    pub fn video_destination(&self, video: &Video) -> PathBuf {
        utils::video_dir(&self.settings.output_dir, &video.title)
    }

    /// Downloads `video` into `<output_dir>/<Title>/` and returns the kept file.
    pub async fn download_video(
        &self,
        video: &Video,
        mode: Mode,
        chooser: &dyn StreamChooser,
    ) -> Result<PathBuf> {
        let dest_dir = self.video_destination(video);
        info!("Downloading \"{}\" ({} mode)", video.title, mode);
        self.pipeline.run(video, mode, &dest_dir, chooser).await
    }

    /// Downloads every entry of `playlist` into `<output_dir>/<Playlist>/<audio|video>/`.
    pub async fn download_playlist(&self, playlist: &Playlist, mode: PlaylistMode) -> PlaylistReport {
        self.playlists
            .run(playlist, mode, &self.settings.output_dir)
            .await
    }

    pub fn playlist_destination(&self, playlist: &Playlist, mode: PlaylistMode) -> PathBuf {
        PlaylistOrchestrator::destination(playlist, mode, &self.settings.output_dir)
    }
}
