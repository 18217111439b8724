use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("cannot read video file {path}: {reason}")]
    NotReadable { path: PathBuf, reason: String },
    #[error("cannot write video file {path}: {reason}")]
    NotWritable { path: PathBuf, reason: String },
    #[error("cannot find any video stream in {0}")]
    NoVideoStream(PathBuf),
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),
    #[error("cannot allocate {0}")]
    Allocation(String),
    #[error("decoding failed: {0}")]
    Decode(String),
    #[error("stream ended after {position} frames, expected {expected}")]
    ShortRead { position: usize, expected: usize },
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("invalid index ({index}) >= number of frames ({length})")]
    Index { index: i64, length: usize },
    #[error("width and height must be positive multiples of 2, got {width}x{height}")]
    Geometry { width: u32, height: u32 },
    #[error("video {0} is closed for writing")]
    ClosedStream(PathBuf),
    #[error("buffer of shape {actual:?} does not conform to {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("slice step cannot be zero")]
    ZeroStep,
}

impl VideoError {
    /// Mid-stream failures. These are the only errors a lenient bulk load
    /// may swallow; everything else is structural and always propagates.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VideoError::Decode(_) | VideoError::ShortRead { .. })
    }

    pub(crate) fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        VideoError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
