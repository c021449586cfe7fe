/*!
 * Tests for file and directory utilities
 */

use std::path::{Path, PathBuf};

use anyhow::Result;
use unembedder::extraction::Band;
use unembedder::file_utils::{FileManager, FileType};
use crate::common;

/// Test the output path naming scheme
#[test]
fn test_generate_output_path_withSuffix_shouldAppendToStem() {
    let path = FileManager::generate_output_path("/videos/movie.mp4", "/out", "joined", ".srt");
    assert_eq!(path, PathBuf::from("/out/movie_joined.srt"));
}

/// Test per-band file names
#[test]
fn test_band_paths_withBothBands_shouldUseBandSuffixes() {
    let video = Path::new("/videos/movie.mkv");
    let out = Path::new("/videos");

    assert_eq!(FileManager::band_track_path(video, out, Band::Top), PathBuf::from("/videos/movie_top.srt"));
    assert_eq!(FileManager::band_track_path(video, out, Band::Bottom), PathBuf::from("/videos/movie_bot.srt"));
    assert_eq!(FileManager::fixed_track_path(video, out, Band::Top), PathBuf::from("/videos/movie_top_fixed.srt"));
    assert_eq!(FileManager::fixed_track_path(video, out, Band::Bottom), PathBuf::from("/videos/movie_bot_fixed.srt"));
    assert_eq!(FileManager::joined_path(video, out), PathBuf::from("/videos/movie_joined.srt"));
}

/// Test the fixed path of a standalone track
#[test]
fn test_fixed_path_for_withTrackFile_shouldStaySideBySide() {
    assert_eq!(
        FileManager::fixed_path_for("/tracks/movie_bot.srt"),
        PathBuf::from("/tracks/movie_bot_fixed.srt")
    );
}

/// Test finding video files in a directory tree
#[test]
fn test_find_videos_withMixedFiles_shouldReturnSortedVideos() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    FileManager::ensure_dir(dir.join("season"))?;
    common::create_test_file(dir, "b.MP4", "")?;
    common::create_test_file(dir, "a.mkv", "")?;
    common::create_test_file(dir, "notes.txt", "")?;
    common::create_test_file(&dir.join("season"), "c.avi", "")?;

    let videos = FileManager::find_videos(dir)?;

    let names: Vec<String> = videos
        .iter()
        .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.mkv", "b.MP4", "season/c.avi"]);
    Ok(())
}

/// Test finding files by extension
#[test]
fn test_find_files_withSrtExtension_shouldMatchCaseInsensitively() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "one.srt", "")?;
    common::create_test_file(temp_dir.path(), "two.SRT", "")?;
    common::create_test_file(temp_dir.path(), "three.txt", "")?;

    let files = FileManager::find_files(temp_dir.path(), ".srt")?;
    assert_eq!(files.len(), 2);
    Ok(())
}

/// Test file type detection by extension
#[test]
fn test_detect_file_type_withKnownFiles_shouldClassify() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let srt = common::create_fragmented_track(temp_dir.path(), "track.srt")?;
    let video = common::create_fake_video(temp_dir.path(), "movie.mp4")?;

    assert_eq!(FileManager::detect_file_type(&srt)?, FileType::Subtitle);
    assert_eq!(FileManager::detect_file_type(&video)?, FileType::Video);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.mp4")).is_err());
    Ok(())
}

/// Test writing, reading and removing a file
#[test]
fn test_write_read_remove_withNestedPath_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("a").join("b").join("file.txt");

    FileManager::write_to_file(&path, "content")?;
    assert!(FileManager::file_exists(&path));
    assert_eq!(FileManager::read_to_string(&path)?, "content");

    FileManager::remove_file(&path)?;
    assert!(!FileManager::file_exists(&path));
    // Removing a missing file is not an error
    FileManager::remove_file(&path)?;
    Ok(())
}
