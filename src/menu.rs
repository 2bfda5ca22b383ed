//! The interactive menus: their text, and how answers are parsed.

use crate::error::{Error, Result};
use crate::model::{Stream, Video};
use crate::playlist::PlaylistMode;
use crate::selection::{Mode, StreamChooser};
use std::io::{BufRead, Write};

/// Single video or playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadType {
    Video,
    Playlist,
}

pub const DOWNLOAD_TYPE_MENU: &str = "Select download type:\n  1 - Single Video\n  2 - Playlist";
pub const DOWNLOAD_TYPE_PROMPT: &str = "Your choice (1 or 2): ";

pub const VIDEO_MODE_PROMPT: &str = "Your choice (m/va/aa): ";
pub const PLAYLIST_MODE_PROMPT: &str = "Your choice (a/v): ";

pub fn video_mode_menu(max_height: u32) -> String {
    format!(
        "\nSelect mode for Single Video Download:\n  \
         - Enter 'm' for manual stream selection\n  \
         - Enter 'va' for automatic video+audio combo (best quality up to {}p)\n  \
         - Enter 'aa' for automatic audio-only download",
        max_height
    )
}

pub fn playlist_mode_menu(max_height: u32) -> String {
    format!(
        "\nSelect mode for Playlist Download:\n  \
         - Enter 'a' for audio-only (best quality)\n  \
         - Enter 'v' for video with audio (automatic best combo up to {}p)",
        max_height
    )
}

pub const STREAM_PROMPT: &str = "\nSelect a stream (enter index): ";

pub fn parse_download_type(answer: &str) -> Result<DownloadType> {
    match answer.trim() {
        "1" => Ok(DownloadType::Video),
        "2" => Ok(DownloadType::Playlist),
        other => Err(Error::InvalidUserInput(format!(
            "'{}' is not a download type, expected 1 or 2",
            other
        ))),
    }
}

pub fn parse_video_mode(answer: &str) -> Result<Mode> {
    match answer.trim().to_lowercase().as_str() {
        "m" => Ok(Mode::Manual),
        "va" => Ok(Mode::AutoVideo),
        "aa" => Ok(Mode::AutoAudio),
        other => Err(Error::InvalidUserInput(format!(
            "'{}' is not a single video mode, expected m, va or aa",
            other
        ))),
    }
}

pub fn parse_playlist_mode(answer: &str) -> Result<PlaylistMode> {
    match answer.trim().to_lowercase().as_str() {
        "a" => Ok(PlaylistMode::Audio),
        "v" => Ok(PlaylistMode::Video),
        other => Err(Error::InvalidUserInput(format!(
            "'{}' is not a playlist mode, expected a or v",
            other
        ))),
    }
}

pub fn parse_index(answer: &str, len: usize) -> Result<usize> {
    let index = answer
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::InvalidUserInput(format!("'{}' is not a stream index", answer.trim())))?;

    if index >= len {
        return Err(Error::InvalidUserInput(format!(
            "stream index {} is out of range",
            index
        )));
    }
    Ok(index)
}

/// The numbered stream listing shown in manual mode.
pub fn stream_listing(streams: &[Stream]) -> Vec<String> {
    streams
        .iter()
        .enumerate()
        .map(|(index, stream)| format!("Index: {} | {}", index, stream))
        .collect()
}

/// The lines describing a video before its mode is picked.
pub fn video_details(video: &Video) -> Vec<String> {
    vec![
        "\nVideo Details:".to_string(),
        format!("Title: {}", video.title),
        format!("Author: {}", video.author.as_deref().unwrap_or("unknown")),
        format!(
            "Length (seconds): {}",
            video
                .duration
                .map(|seconds| seconds.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        ),
        match video.view_count {
            Some(views) => format!("Views: {}", views),
            None => "Views: N/A".to_string(),
        },
    ]
}

/// Prints a question and reads one trimmed answer line.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Asks `question` on the terminal. Stdin is only locked for the duration of the call.
pub fn prompt(question: &str) -> Result<String> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    ask(&mut stdin.lock(), &mut stdout.lock(), question)
}

/// Lets the user pick a stream on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalChooser;

impl StreamChooser for TerminalChooser {
    fn choose(&self, streams: &[Stream]) -> Result<usize> {
        println!("\nAvailable Streams:");
        for line in stream_listing(streams) {
            println!("{}", line);
        }

        let answer = prompt(STREAM_PROMPT)?;
        parse_index(&answer, streams.len())
    }
}
