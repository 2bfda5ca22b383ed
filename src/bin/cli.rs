use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{LevelFilter, info};
use std::path::PathBuf;
use ytgrab::config::Settings;
use ytgrab::error::Error;
use ytgrab::menu::{self, DownloadType, TerminalChooser};
use ytgrab::progress::Progress;
use ytgrab::selection::{FixedChoice, Mode, StreamChooser};
use ytgrab::{UrlKind, Ytgrab, classify_url};

#[derive(Parser, Clone)]
#[command(version, about)]
pub struct Cli {
    /// A YouTube video or playlist URL. Asked for when missing.
    pub url: Option<String>,

    /// Treat the URL as a playlist.
    #[arg(long = "playlist", short, action = clap::ArgAction::SetTrue)]
    pub playlist: bool,

    /// `m`, `va` or `aa` for a video; `a` or `v` for a playlist. Asked for when missing.
    #[arg(
        long = "mode",
        short,
        value_parser = clap::builder::PossibleValuesParser::new(["m", "va", "aa", "a", "v"])
    )]
    pub mode: Option<String>,

    /// The stream to download in manual mode, skipping the listing prompt.
    #[arg(long = "index", short)]
    pub index: Option<usize>,

    #[arg(long = "output-dir", short)]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "max-height")]
    pub max_height: Option<u32>,

    #[arg(
        long = "audio-bitrate",
        short = 'b',
        value_parser = clap::builder::PossibleValuesParser::new([
            "8k", "16k", "24k", "32k", "40k", "48k", "64k", "80k", "96k", "112k", "128k", "160k", "192k", "224k", "256k", "320k"
        ])
    )]
    pub audio_bitrate: Option<String>,

    #[arg(long = "ffmpeg")]
    pub ffmpeg: Option<PathBuf>,

    #[arg(long = "yt-dlp")]
    pub yt_dlp: Option<PathBuf>,

    /// Read settings from this file instead of the default location.
    #[arg(long = "config", short)]
    pub config: Option<PathBuf>,

    #[arg(
        long = "verbosity",
        short,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "error", "none", "full"
        ])
    )]
    pub verbosity: String,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = match &self.config {
            Some(path) => Settings::load_or_default(path),
            None => Settings::load(),
        };

        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(height) = self.max_height {
            settings.max_height = height;
        }
        if let Some(bitrate) = &self.audio_bitrate {
            settings.audio_bitrate = bitrate.clone();
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            settings.ffmpeg = ffmpeg.clone();
        }
        if let Some(yt_dlp) = &self.yt_dlp {
            settings.yt_dlp = yt_dlp.clone();
        }
        settings
    }
}

fn init_logging(verbosity: &str, multi: &MultiProgress) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder.format_target(false).format_timestamp(None);
    match verbosity {
        "none" => builder.filter_level(LevelFilter::Off),
        "error" => builder.filter_level(LevelFilter::Error),
        "debug" => builder
            .filter_level(LevelFilter::Warn)
            .filter_module("ytgrab", LevelFilter::Debug),
        "full" => builder.filter_level(LevelFilter::Trace),
        _ => builder
            .filter_level(LevelFilter::Warn)
            .filter_module("ytgrab", LevelFilter::Info),
    };

    let logger = builder.build();
    let level = logger.filter();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();
    let progress = Progress::default();
    init_logging(&args.verbosity, progress.multi())?;

    let app = Ytgrab::new(args.settings(), progress);

    let download_type = match (&args.url, args.playlist) {
        (_, true) => DownloadType::Playlist,
        (Some(url), false) => match classify_url(url)? {
            Some(UrlKind::Playlist) => DownloadType::Playlist,
            _ => DownloadType::Video,
        },
        (None, false) => {
            println!("{}", menu::DOWNLOAD_TYPE_MENU);
            menu::parse_download_type(&menu::prompt(menu::DOWNLOAD_TYPE_PROMPT)?)?
        }
    };

    let url = match args.url.clone() {
        Some(url) => url,
        None => match download_type {
            DownloadType::Video => menu::prompt("Enter the YouTube URL: ")?,
            DownloadType::Playlist => menu::prompt("Enter the Playlist URL: ")?,
        },
    };
    if url.trim().is_empty() {
        println!("No URL provided, exiting.");
        return Ok(());
    }

    let result = match download_type {
        DownloadType::Video => single_video(&app, &args, &url).await,
        DownloadType::Playlist => playlist(&app, &args, &url).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn single_video(app: &Ytgrab, args: &Cli, url: &str) -> Result<(), Error> {
    let video = app.lookup_video(url).await?;
    for line in menu::video_details(&video) {
        println!("{}", line);
    }

    let mode = match args.mode.as_deref() {
        Some(answer) => menu::parse_video_mode(answer)?,
        None => {
            println!("{}", menu::video_mode_menu(app.max_height()));
            menu::parse_video_mode(&menu::prompt(menu::VIDEO_MODE_PROMPT)?)?
        }
    };

    let chooser: Box<dyn StreamChooser> = match (mode, args.index) {
        (Mode::Manual, Some(index)) => Box::new(FixedChoice(index)),
        _ => Box::new(TerminalChooser),
    };

    let path = app.download_video(&video, mode, chooser.as_ref()).await?;
    info!("Download complete");
    println!("\nSaved to: {}", path.display());
    Ok(())
}

async fn playlist(app: &Ytgrab, args: &Cli, url: &str) -> Result<(), Error> {
    let playlist = app.lookup_playlist(url).await?;

    let mode = match args.mode.as_deref() {
        Some(answer) => menu::parse_playlist_mode(answer)?,
        None => {
            println!("{}", menu::playlist_mode_menu(app.max_height()));
            menu::parse_playlist_mode(&menu::prompt(menu::PLAYLIST_MODE_PROMPT)?)?
        }
    };

    let report = app.download_playlist(&playlist, mode).await;

    println!(
        "\n{} of {} videos saved to: {}",
        report.completed.len(),
        report.total,
        app.playlist_destination(&playlist, mode).display()
    );
    for failure in &report.failed {
        println!("  failed {} ({}): {}", failure.position, failure.url, failure.error);
    }
    Ok(())
}
