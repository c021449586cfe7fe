/*!
 * Tests for error types and conversions
 */

use unembedder::errors::{AppError, ExtractionError, RecognitionError, SubtitleError, TimelineError};

/// Test error messages name the failing detail
#[test]
fn test_error_display_withFields_shouldIncludeDetails() {
    let stream_info = ExtractionError::StreamInfo { path: "movie.mp4".to_string(), message: "no video stream".to_string() };
    assert_eq!(stream_info.to_string(), "Failed to read stream info of video movie.mp4: no video stream");

    let failed = RecognitionError::Failed { status: 1, stderr: "bad image".to_string() };
    assert_eq!(failed.to_string(), "Recognizer exited with status 1: bad image");

    assert_eq!(
        TimelineError::DanglingCue { index: 3 }.to_string(),
        "Timeline finished with cue 3 still open"
    );
}

/// Test conversions into the application error
#[test]
fn test_app_error_from_withComponentErrors_shouldWrap() {
    let err: AppError = ExtractionError::Decoder("pipe closed".to_string()).into();
    assert!(matches!(err, AppError::Extraction(ExtractionError::Decoder(_))));
    assert_eq!(err.to_string(), "Extraction error: Frame decoder error: pipe closed");

    let err: AppError = TimelineError::NoOpenCue { end_ms: 1500 }.into();
    assert!(matches!(err, AppError::Timeline(TimelineError::NoOpenCue { end_ms: 1500 })));

    let err: AppError = SubtitleError::InvalidTimestamp("99".to_string()).into();
    assert!(matches!(err, AppError::Subtitle(_)));

    let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, AppError::File(_)));
}

/// Test anyhow interoperability
#[test]
fn test_app_error_withAnyhow_shouldConvertBothWays() {
    let err: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(err, AppError::Unknown(ref message) if message == "something odd"));

    let wrapped = anyhow::Error::from(AppError::Config("bad".to_string()));
    assert_eq!(wrapped.to_string(), "Configuration error: bad");
}
