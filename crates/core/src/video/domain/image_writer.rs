use std::path::Path;

use crate::shared::error::VideoError;
use crate::shared::frame::Frame;

/// Saves a single decoded frame as a still image.
pub trait ImageWriter: Send {
    /// Writes `frame` to `path`, optionally resized to `size` (width, height).
    /// The image format follows the file extension.
    fn write(&self, path: &Path, frame: &Frame, size: Option<(u32, u32)>)
        -> Result<(), VideoError>;
}
