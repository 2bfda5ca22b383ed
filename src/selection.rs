//! Picking which stream(s) of a video to download.

use crate::error::{Error, Result};
use crate::model::{Stream, StreamCatalog, StreamKind};
use log::debug;
use ordered_float::OrderedFloat;
use std::fmt;

/// How the streams of a single video are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The user picks one stream from the listing.
    Manual,
    /// Best video up to the configured height, with audio.
    AutoVideo,
    /// Best audio-only stream.
    AutoAudio,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Manual => write!(f, "manual"),
            Mode::AutoVideo => write!(f, "video"),
            Mode::AutoAudio => write!(f, "audio"),
        }
    }
}

/// The outcome of a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// One stream, kept as downloaded.
    Single(Stream),
    /// A video-only and an audio-only stream that must be merged.
    Split { video: Stream, audio: Stream },
}

impl Selection {
    pub fn needs_merge(&self) -> bool {
        matches!(self, Selection::Split { .. })
    }

    pub fn streams(&self) -> Vec<&Stream> {
        match self {
            Selection::Single(stream) => vec![stream],
            Selection::Split { video, audio } => vec![video, audio],
        }
    }
}

/// Asks someone to pick a stream for manual mode.
pub trait StreamChooser: Send + Sync {
    /// Returns the index of the chosen stream in `streams`.
    fn choose(&self, streams: &[Stream]) -> Result<usize>;
}

/// A chooser that always answers with the same index.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub usize);

impl StreamChooser for FixedChoice {
    fn choose(&self, _streams: &[Stream]) -> Result<usize> {
        Ok(self.0)
    }
}

/// A chooser for flows nobody is watching; manual selection fails.
#[derive(Debug, Clone, Copy)]
pub struct Unattended;

impl StreamChooser for Unattended {
    fn choose(&self, _streams: &[Stream]) -> Result<usize> {
        Err(Error::InvalidUserInput(
            "manual stream selection needs an interactive terminal".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    max_height: u32,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(1080)
    }
}

impl SelectionPolicy {
    pub fn new(max_height: u32) -> Self {
        Self { max_height }
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Chooses the stream(s) to download for `mode`.
    ///
    /// # Errors
    ///
    /// `NoStreamAvailable` when nothing in the catalog fits the mode,
    /// `InvalidUserInput` when the chooser picks an index outside the listing.
    pub fn select(
        &self,
        catalog: &StreamCatalog,
        mode: Mode,
        chooser: &dyn StreamChooser,
    ) -> Result<Selection> {
        match mode {
            Mode::Manual => self.select_manual(catalog, chooser),
            Mode::AutoVideo => self.best_video_with_audio(catalog),
            Mode::AutoAudio => self.best_audio(catalog).cloned().map(Selection::Single),
        }
    }

    fn select_manual(
        &self,
        catalog: &StreamCatalog,
        chooser: &dyn StreamChooser,
    ) -> Result<Selection> {
        if catalog.is_empty() {
            return Err(Error::NoStreamAvailable("downloadable".to_string()));
        }

        let index = chooser.choose(catalog.streams())?;
        let stream = catalog.get(index).ok_or_else(|| {
            Error::InvalidUserInput(format!(
                "stream index {} is out of range (0-{})",
                index,
                catalog.len() - 1
            ))
        })?;

        Ok(Selection::Single(stream.clone()))
    }

    /// The highest-bitrate audio-only stream; the earliest one wins a tie.
    pub fn best_audio<'a>(&self, catalog: &'a StreamCatalog) -> Result<&'a Stream> {
        catalog
            .audio_only()
            .rev()
            .max_by_key(|stream| OrderedFloat(stream.effective_audio_bitrate()))
            .ok_or_else(|| Error::NoStreamAvailable("audio-only".to_string()))
    }

    /// The best video up to the maximum height, with its audio.
    ///
    /// Among the streams at the best available height, a progressive one is preferred
    /// so no merge is needed. Otherwise the highest-bitrate video-only stream is
    /// paired with the best audio-only stream.
    pub fn best_video_with_audio(&self, catalog: &StreamCatalog) -> Result<Selection> {
        let candidates: Vec<&Stream> = catalog
            .with_video()
            .filter(|stream| stream.height.is_some_and(|h| h <= self.max_height))
            .collect();

        let best_height = candidates
            .iter()
            .filter_map(|stream| stream.height)
            .max()
            .ok_or_else(|| {
                Error::NoStreamAvailable(format!("video (up to {}p)", self.max_height))
            })?;

        let group: Vec<&Stream> = candidates
            .into_iter()
            .filter(|stream| stream.height == Some(best_height))
            .collect();

        let progressive = group
            .iter()
            .rev()
            .filter(|stream| stream.kind == StreamKind::Progressive)
            .max_by_key(|stream| {
                (
                    OrderedFloat(stream.effective_audio_bitrate()),
                    OrderedFloat(stream.bitrate.unwrap_or(0.0)),
                )
            });

        if let Some(stream) = progressive {
            debug!("Using progressive stream {} at {}p", stream.id, best_height);
            return Ok(Selection::Single((*stream).clone()));
        }

        let video = group
            .iter()
            .rev()
            .max_by_key(|stream| OrderedFloat(stream.bitrate.unwrap_or(0.0)))
            .ok_or_else(|| Error::NoStreamAvailable("video-only".to_string()))?;
        let audio = self.best_audio(catalog)?;

        debug!(
            "Pairing video stream {} at {}p with audio stream {}",
            video.id, best_height, audio.id
        );

        Ok(Selection::Split {
            video: (*video).clone(),
            audio: audio.clone(),
        })
    }
}
