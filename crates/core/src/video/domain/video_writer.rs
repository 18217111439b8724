use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ndarray::{ArrayView3, ArrayView4, ArrayViewD, Ix3, Ix4};

use crate::shared::constants::CHANNELS;
use crate::shared::error::VideoError;
use crate::video::domain::media_backend::{EncodeSession, EncodingFormat, MediaBackend};
use crate::video::domain::writer_config::WriterConfig;

/// Encodes `(3, H, W)` RGB frames into a video file.
///
/// The writer is open from construction until [`close`](Self::close).
/// Dropping an open writer finalizes the file, so a forgotten `close` never
/// leaves a container without its trailer.
pub struct VideoWriter {
    path: PathBuf,
    config: WriterConfig,
    format: EncodingFormat,
    session: Option<Box<dyn EncodeSession>>,
    frames_written: usize,
}

impl VideoWriter {
    pub fn with_backend(
        path: impl AsRef<Path>,
        config: WriterConfig,
        backend: &dyn MediaBackend,
    ) -> Result<Self, VideoError> {
        config.validate_geometry()?;
        let path = path.as_ref().to_path_buf();
        let session = backend.open_encoder(&path, &config)?;
        let format = session.format().clone();
        log::debug!(
            "Opened {} for writing: {}x{} {} in {}",
            path.display(),
            config.width,
            config.height,
            format.codec_name,
            format.format_name
        );

        Ok(Self {
            path,
            config,
            format,
            session: Some(session),
            frames_written: 0,
        })
    }

    /// Encodes one `(3, H, W)` frame.
    pub fn append(&mut self, frame: ArrayView3<'_, u8>) -> Result<(), VideoError> {
        let expected = self.frame_shape();
        let Some(session) = self.session.as_mut() else {
            return Err(VideoError::ClosedStream(self.path.clone()));
        };
        if frame.shape() != expected {
            return Err(VideoError::shape_mismatch(&expected, frame.shape()));
        }
        session.encode(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Encodes an `(N, 3, H, W)` batch in order.
    pub fn append_batch(&mut self, frames: ArrayView4<'_, u8>) -> Result<(), VideoError> {
        if !self.is_opened() {
            return Err(VideoError::ClosedStream(self.path.clone()));
        }
        let expected = self.frame_shape();
        if frames.shape()[1..] != expected {
            let mut batch = vec![frames.shape()[0]];
            batch.extend_from_slice(&expected);
            return Err(VideoError::shape_mismatch(&batch, frames.shape()));
        }
        for frame in frames.outer_iter() {
            self.append(frame)?;
        }
        Ok(())
    }

    /// Accepts either a single frame or a batch, told apart by rank.
    pub fn append_any(&mut self, data: ArrayViewD<'_, u8>) -> Result<(), VideoError> {
        let actual = data.shape().to_vec();
        let mismatch = |_| VideoError::shape_mismatch(&self.frame_shape(), &actual);
        match data.ndim() {
            3 => {
                let frame = data.into_dimensionality::<Ix3>().map_err(mismatch)?;
                self.append(frame)
            }
            4 => {
                let frames = data.into_dimensionality::<Ix4>().map_err(mismatch)?;
                self.append_batch(frames)
            }
            _ => Err(VideoError::shape_mismatch(&self.frame_shape(), &actual)),
        }
    }

    /// Flushes the encoder and writes the container trailer. Calling it
    /// again is a no-op.
    ///
    /// The writer is closed afterwards even if finalizing failed.
    pub fn close(&mut self) -> Result<(), VideoError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.finish()?;
        log::info!(
            "Finalized {} with {} frames",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }

    pub fn is_opened(&self) -> bool {
        self.session.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn frame_shape(&self) -> [usize; 3] {
        [
            CHANNELS,
            self.config.height as usize,
            self.config.width as usize,
        ]
    }

    /// Frames written so far.
    pub fn len(&self) -> usize {
        self.frames_written
    }

    pub fn is_empty(&self) -> bool {
        self.frames_written == 0
    }

    /// Playing time of the frames written so far.
    pub fn duration(&self) -> Duration {
        let (num, den) = self.config.framerate_fraction();
        Duration::from_secs_f64(self.frames_written as f64 * den as f64 / num as f64)
    }

    pub fn framerate(&self) -> f64 {
        self.config.framerate
    }

    pub fn bitrate(&self) -> u64 {
        self.config.bitrate
    }

    pub fn gop(&self) -> u32 {
        self.config.gop
    }

    pub fn codec_name(&self) -> &str {
        &self.format.codec_name
    }

    pub fn codec_long_name(&self) -> &str {
        &self.format.codec_long_name
    }

    pub fn format_name(&self) -> &str {
        &self.format.format_name
    }

    pub fn format_long_name(&self) -> &str {
        &self.format.format_long_name
    }
}

impl fmt::Display for VideoWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video file: {}; Format: {} ({}); Codec: {} ({}); Time: {:.2} s ({} @ {:.2}Hz); Size (w x h): {} x {} pixels",
            self.path.display(),
            self.format.format_long_name,
            self.format.format_name,
            self.format.codec_long_name,
            self.format.codec_name,
            self.duration().as_secs_f64(),
            self.frames_written,
            self.config.framerate,
            self.config.width,
            self.config.height,
        )
    }
}

impl fmt::Debug for VideoWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoWriter")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("format", &self.format)
            .field("opened", &self.is_opened())
            .field("frames_written", &self.frames_written)
            .finish()
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to finalize {}: {e}", self.path.display());
        }
    }
}
