mod common;

use common::*;
use std::sync::atomic::Ordering;
use ytgrab::error::Error;
use ytgrab::playlist::PlaylistMode;

const LIST_URL: &str = "https://www.youtube.com/playlist?list=PLtest";

fn three_videos() -> Vec<ytgrab::model::Video> {
    vec![
        split_video("a1", "First Song"),
        split_video("a2", "Second Song"),
        split_video("a3", "Third Song"),
    ]
}

#[tokio::test]
async fn one_failing_entry_does_not_stop_the_rest() {
    let h = harness(
        MockProvider::default()
            .with_playlist(LIST_URL, Some("Road Trip"), three_videos())
            .failing("251", "a2"),
        MockMuxer::default(),
    );

    let playlist = h.app.lookup_playlist(LIST_URL).await.unwrap();
    let report = h.app.download_playlist(&playlist, PlaylistMode::Audio).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_complete());
    assert_eq!(report.failed[0].position, 2);
    assert_eq!(report.failed[0].url, watch_url("a2"));
    assert!(matches!(report.failed[0].error, Error::Fetch { .. }));

    let folder = h.dir.path().join("downloads").join("Road_Trip").join("audio");
    assert_eq!(
        files_in(&folder),
        ["First_Song_audio.m4a", "Third_Song_audio.m4a"]
    );
    assert_eq!(h.app.playlist_destination(&playlist, PlaylistMode::Audio), folder);
    // the playlist itself, then one lookup per entry
    assert_eq!(h.provider.lookups.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn video_mode_merges_every_entry() {
    let h = harness(
        MockProvider::default().with_playlist(LIST_URL, Some("Road Trip"), three_videos()),
        MockMuxer::default(),
    );

    let playlist = h.app.lookup_playlist(LIST_URL).await.unwrap();
    let report = h.app.download_playlist(&playlist, PlaylistMode::Video).await;

    assert!(report.is_complete());
    assert_eq!(h.muxer.calls(), 3);

    let folder = h.dir.path().join("downloads").join("Road_Trip").join("video");
    assert_eq!(
        files_in(&folder),
        ["First_Song.mp4", "Second_Song.mp4", "Third_Song.mp4"]
    );
    assert_eq!(report.completed[0], folder.join("First_Song.mp4"));
}

#[tokio::test]
async fn unavailable_entries_are_reported() {
    let mut videos = three_videos();
    videos.insert(1, split_video("gone", "Deleted"));
    let provider = MockProvider::default()
        .with_playlist(LIST_URL, None, videos)
        .without_video(&watch_url("gone"));

    let h = harness(provider, MockMuxer::default());
    let playlist = h.app.lookup_playlist(LIST_URL).await.unwrap();
    let report = h.app.download_playlist(&playlist, PlaylistMode::Video).await;

    assert_eq!(report.total, 4);
    assert_eq!(report.completed.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].position, 2);
    assert_eq!(h.muxer.calls(), 3);

    let folder = h
        .dir
        .path()
        .join("downloads")
        .join("Untitled_Playlist")
        .join("video");
    assert_eq!(files_in(&folder).len(), 3);
}

#[tokio::test]
async fn failed_merges_do_not_stop_the_playlist() {
    let h = harness(
        MockProvider::default().with_playlist(LIST_URL, Some("Road Trip"), three_videos()),
        MockMuxer::failing(),
    );

    let playlist = h.app.lookup_playlist(LIST_URL).await.unwrap();
    let report = h.app.download_playlist(&playlist, PlaylistMode::Video).await;

    assert!(report.completed.is_empty());
    assert_eq!(h.muxer.calls(), 3);
    assert_eq!(
        report.failed.iter().map(|f| f.position).collect::<Vec<_>>(),
        [1, 2, 3]
    );
    assert!(report.failed.iter().all(|f| matches!(f.error, Error::Merge { .. })));
}

#[tokio::test]
async fn watch_urls_with_a_list_are_accepted_as_playlists() {
    let url = "https://www.youtube.com/watch?v=a1&list=PLtest";
    let h = harness(
        MockProvider::default().with_playlist(url, Some("Mix"), three_videos()),
        MockMuxer::default(),
    );

    let playlist = h.app.lookup_playlist(url).await.unwrap();
    assert_eq!(playlist.entries.len(), 3);
}

#[tokio::test]
async fn single_video_urls_are_not_playlists() {
    let h = harness(MockProvider::default(), MockMuxer::default());

    let result = h.app.lookup_playlist(&watch_url("a1")).await;
    assert!(matches!(result, Err(Error::InvalidUserInput(_))));
}
