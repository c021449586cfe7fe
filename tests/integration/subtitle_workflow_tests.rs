/*!
 * Integration tests for the fix and join workflows on existing tracks
 */

use std::path::Path;

use anyhow::Result;
use unembedder::app_config::Config;
use unembedder::app_controller::Controller;
use unembedder::consolidation::MergePolicy;
use unembedder::subtitle_processor::SubtitleCollection;
use crate::common;

/// Fixing a raw track merges fragments and drops empty cues
#[test]
fn test_fix_file_withFragmentedTrack_shouldWriteFixedTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let track = common::create_fragmented_track(temp_dir.path(), "movie_top.srt")?;
    let controller = Controller::with_config(Config::default())?;

    let output = controller.fix_file(&track, None)?;

    assert_eq!(output, temp_dir.path().join("movie_top_fixed.srt"));
    let fixed = SubtitleCollection::read_from_srt(&output, None)?;
    assert_eq!(
        common::timings(&fixed.entries),
        vec![
            (1000, 3000, "Hello world".to_string()),
            (5000, 7000, "Goodbye now".to_string()),
        ]
    );
    assert_eq!(fixed.entries.iter().map(|e| e.seq_num).collect::<Vec<_>>(), vec![1, 2]);
    Ok(())
}

/// An explicit output path is honoured
#[test]
fn test_fix_file_withOutputPath_shouldWriteThere() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let track = common::create_fragmented_track(temp_dir.path(), "movie_bot.srt")?;
    let target = temp_dir.path().join("elsewhere").join("clean.srt");
    let controller = Controller::with_config(Config::default())?;

    let output = controller.fix_file(&track, Some(target.clone()))?;

    assert_eq!(output, target);
    assert!(target.exists());
    Ok(())
}

/// A dictionary configured in the config corrects merged text
#[test]
fn test_fix_file_withDictionary_shouldCorrectMergedText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dictionary = common::create_test_file(temp_dir.path(), "words.txt", "hello 5\nworld 5\n")?;
    let track = common::create_test_file(
        temp_dir.path(),
        "movie_top.srt",
        "1\n00:00:00,000 --> 00:00:01,000\nHelo wrld\n\n2\n00:00:01,000 --> 00:00:02,000\nHelo wrld\n\n",
    )?;
    let mut config = Config::default();
    config.spelling.dictionary_path = Some(dictionary);
    let controller = Controller::with_config(config)?;

    let output = controller.fix_file(&track, None)?;

    let fixed = SubtitleCollection::read_from_srt(&output, None)?;
    assert_eq!(common::timings(&fixed.entries), vec![(0, 2000, "Hello world".to_string())]);
    Ok(())
}

/// Joining two tracks writes `<video>_joined.srt` next to the top track
#[test]
fn test_join_files_withFixedTracks_shouldConcatenate() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(
        temp_dir.path(),
        "movie_top_fixed.srt",
        "1\n00:00:00,000 --> 00:00:02,000\nA\n\n",
    )?;
    let bottom = common::create_test_file(
        temp_dir.path(),
        "movie_bot_fixed.srt",
        "1\n00:00:01,000 --> 00:00:03,000\nB\n\n",
    )?;
    let controller = Controller::with_config(Config::default())?;

    let output = controller.join_files(&top, &bottom, None)?;

    assert_eq!(output, temp_dir.path().join("movie_joined.srt"));
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "1\n00:00:00,000 --> 00:00:02,000\nA\n\n2\n00:00:01,000 --> 00:00:03,000\nB\n\n"
    );
    Ok(())
}

/// Time-sorted joining orders by start time
#[test]
fn test_join_files_withTimeSorted_shouldOrderByStart() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(
        temp_dir.path(),
        "movie_top.srt",
        "1\n00:00:05,000 --> 00:00:06,000\nlate\n\n",
    )?;
    let bottom = common::create_test_file(
        temp_dir.path(),
        "movie_bot.srt",
        "1\n00:00:01,000 --> 00:00:02,000\nearly\n\n",
    )?;
    let mut config = Config::default();
    config.merge_policy = MergePolicy::TimeSorted;
    let controller = Controller::with_config(config)?;

    let output = controller.join_files(&top, &bottom, None)?;

    let joined = SubtitleCollection::read_from_srt(&output, None)?;
    assert_eq!(
        common::timings(&joined.entries),
        vec![(1000, 2000, "early".to_string()), (5000, 6000, "late".to_string())]
    );
    Ok(())
}

/// Joining drops cues without text or without duration
#[test]
fn test_join_files_withInvalidCues_shouldDropThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let top = common::create_test_file(
        temp_dir.path(),
        "movie_top.srt",
        "1\n00:00:00,000 --> 00:00:01,000\n\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n\n",
    )?;
    let bottom = common::create_test_file(
        temp_dir.path(),
        "movie_bot.srt",
        "1\n00:00:03,000 --> 00:00:03,000\nzero\n\n2\n00:00:04,000 --> 00:00:05,000\nalso kept\n\n",
    )?;
    let controller = Controller::with_config(Config::default())?;

    let output = controller.join_files(&top, &bottom, None)?;

    assert_eq!(
        std::fs::read_to_string(&output)?,
        "1\n00:00:01,000 --> 00:00:02,000\nkept\n\n2\n00:00:04,000 --> 00:00:05,000\nalso kept\n\n"
    );
    Ok(())
}

/// The joined name is derived from the top track name
#[test]
fn test_joined_path_for_withTrackNames_shouldStripBandSuffixes() {
    assert_eq!(
        Controller::joined_path_for(Path::new("/v/movie_top_fixed.srt")),
        Path::new("/v/movie_joined.srt")
    );
    assert_eq!(
        Controller::joined_path_for(Path::new("/v/movie_top.srt")),
        Path::new("/v/movie_joined.srt")
    );
    assert_eq!(
        Controller::joined_path_for(Path::new("/v/other.srt")),
        Path::new("/v/other_joined.srt")
    );
}
