use std::path::Path;

use crate::shared::error::VideoError;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// Supports optional resizing for thumbnails.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), VideoError> {
        let not_writable = |reason: String| VideoError::NotWritable {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| not_writable(e.to_string()))?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.to_interleaved())
            .ok_or_else(|| not_writable("frame does not fill an RGB image".to_string()))?;

        let img = match size {
            Some((w, h)) => image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle),
            None => img,
        };

        img.save(path).map_err(|e| not_writable(e.to_string()))?;
        log::debug!(
            "Saved frame {} as {}x{} image {}",
            frame.index(),
            img.width(),
            img.height(),
            path.display()
        );
        Ok(())
    }
}
