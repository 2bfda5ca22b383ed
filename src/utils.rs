//! File naming and output folder layout.

use crate::model::StreamKind;
use std::path::{Path, PathBuf};

const MAX_NAME_LENGTH: usize = 255;

/// Makes a title usable as a file or folder name.
///
/// Drops `\ / * ? : " < > |`, trims, replaces spaces with `_` and caps the length.
pub fn safe_name(name: &str) -> String {
    let safe = name
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .trim()
        .replace(' ', "_");

    let safe: String = safe.chars().take(MAX_NAME_LENGTH).collect();
    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        return "untitled".to_string();
    }
    safe
}

/// The role a file plays in a video's folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// The file the user keeps.
    Final,
    /// A video-only stream, merged away unless picked manually.
    Video,
    /// An audio-only stream.
    Audio,
}

impl FileRole {
    /// The role a downloaded stream's file gets when it is kept as is.
    pub fn for_kind(kind: StreamKind) -> Self {
        match kind {
            StreamKind::Progressive => FileRole::Final,
            StreamKind::VideoOnly => FileRole::Video,
            StreamKind::AudioOnly => FileRole::Audio,
        }
    }

    /// The file name without extension, e.g. `My_Video_audio`.
    pub fn stem(&self, title: &str) -> String {
        let base = safe_name(title);
        match self {
            FileRole::Final => base,
            FileRole::Video => format!("{}_video", base),
            FileRole::Audio => format!("{}_audio", base),
        }
    }
}

/// `<base>/<Title>/` for a single video download.
pub fn video_dir(base: &Path, title: &str) -> PathBuf {
    base.join(safe_name(title))
}

/// `<base>/<PlaylistTitle>/<audio|video>/` for a playlist download.
pub fn playlist_dir(base: &Path, playlist_title: &str, subfolder: &str) -> PathBuf {
    base.join(safe_name(playlist_title)).join(subfolder)
}

/// Removes a file, treating "already gone" as success.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("  My Video: Part 1/2 "), "My_Video_Part_12");
        assert_eq!(safe_name("a*b?c\"d<e>f|g\\h"), "abcdefgh");
        assert_eq!(safe_name("normal-name"), "normal-name");
        assert_eq!(safe_name("???"), "untitled");
        assert_eq!(safe_name(&"é".repeat(300)).chars().count(), 255);
    }

    #[test]
    fn test_stems() {
        assert_eq!(FileRole::Final.stem("Some Title"), "Some_Title");
        assert_eq!(FileRole::Video.stem("Some Title"), "Some_Title_video");
        assert_eq!(FileRole::Audio.stem("Some Title"), "Some_Title_audio");
        assert_eq!(FileRole::for_kind(StreamKind::AudioOnly), FileRole::Audio);
        assert_eq!(FileRole::for_kind(StreamKind::Progressive), FileRole::Final);
    }

    #[test]
    fn test_layout() {
        let base = Path::new("downloads");
        assert_eq!(
            video_dir(base, "Cat Video"),
            PathBuf::from("downloads/Cat_Video")
        );
        assert_eq!(
            playlist_dir(base, "My Mix", "audio"),
            PathBuf::from("downloads/My_Mix/audio")
        );
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_if_exists(&dir.path().join("nope")).await.is_ok());
    }
}
