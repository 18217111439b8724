use std::path::Path;

use ndarray::{ArrayView3, ArrayViewMut3};

use crate::shared::error::VideoError;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::writer_config::WriterConfig;

/// The codec/container library, seen from the engine.
///
/// There is exactly one production implementation (FFmpeg). Cursor, reader
/// and writer logic only talk to this trait, so none of it depends on which
/// library version is linked.
pub trait MediaBackend: Send + Sync {
    /// Opens a container, selects its first video stream and extracts the
    /// static properties. Holds no resources after returning.
    fn probe(&self, path: &Path) -> Result<StreamInfo, VideoError>;

    /// Acquires a fresh, independent decode session for the stream.
    fn open_decoder(&self, info: &StreamInfo) -> Result<Box<dyn DecodeSession>, VideoError>;

    /// Creates an output container and an encoder configured by `config`.
    fn open_encoder(
        &self,
        path: &Path,
        config: &WriterConfig,
    ) -> Result<Box<dyn EncodeSession>, VideoError>;
}

/// A live decode session: container handle, codec context, picture buffers
/// and color-space converter. All of it is released when dropped.
pub trait DecodeSession: Send {
    /// Decodes forward until the next complete picture.
    ///
    /// With a destination, the picture is converted to RGB and written to it
    /// channel-major. Without one, conversion is skipped. Returns `Ok(false)`
    /// once the container has no more pictures to give.
    fn decode_next(&mut self, dst: Option<ArrayViewMut3<'_, u8>>) -> Result<bool, VideoError>;
}

/// A live encode session owning the output container.
pub trait EncodeSession: Send {
    fn format(&self) -> &EncodingFormat;

    /// Converts one `(3, height, width)` RGB frame and submits it.
    fn encode(&mut self, frame: ArrayView3<'_, u8>) -> Result<(), VideoError>;

    /// Flushes delayed packets and writes the container trailer.
    fn finish(&mut self) -> Result<(), VideoError>;
}

/// Names of the codec and container an encode session ended up with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodingFormat {
    pub codec_name: String,
    pub codec_long_name: String,
    pub format_name: String,
    pub format_long_name: String,
}
