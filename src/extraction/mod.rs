/*!
 * Subtitle extraction from burned-in video text.
 *
 * This module turns a stream of video frames into two timed subtitle tracks,
 * one per band. It is split into several submodules:
 *
 * - `frame`: Frame, band and sample types
 * - `preprocess`: Band cropping and channel-average preprocessing
 * - `similarity`: Frame comparison used to detect caption changes
 * - `accumulator`: Frame averaging for an open cue
 * - `segmenter`: Per-band state machine producing cues
 * - `timeline`: Streaming SubRip writer
 * - `ocr`: Text recognizer trait and the tesseract implementation
 * - `video`: Frame source trait and the ffmpeg implementation
 * - `pipeline`: Per-video driver tying everything together
 * - `mock`: In-memory collaborators for tests
 */

// Re-export main types for easier usage
pub use self::frame::{Band, FrameSample, ProcessedImage, VideoFrame};
pub use self::ocr::{TesseractRecognizer, TextRecognizer};
pub use self::pipeline::{ExtractionOutcome, VideoExtractor};
pub use self::segmenter::{BandSegmenter, CueEvent, SegmentAction, SegmenterState, transition};
pub use self::similarity::{FrameComparator, NormalizedCrossCorrelation};
pub use self::timeline::TimelineWriter;
pub use self::video::{FfmpegFrameSource, FrameSource};

// Submodules
pub mod accumulator;
pub mod frame;
pub mod mock;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod segmenter;
pub mod similarity;
pub mod timeline;
pub mod video;
