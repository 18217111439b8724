use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{Array4, ArrayViewMut4, Axis};

use crate::shared::error::VideoError;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::decode_cursor::DecodeCursor;
use crate::video::domain::frame_slice::FrameSlice;
use crate::video::domain::media_backend::MediaBackend;

/// Callback receiving `(frames_done, frames_total)` before each frame of a
/// bulk load. Returning `false` stops the load.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Knobs for [`VideoReader::load_all_with`] and [`VideoReader::load_into`].
#[derive(Default)]
pub struct LoadOptions {
    /// Propagate mid-stream decode failures instead of stopping quietly.
    pub raise_on_error: bool,
    pub cancelled: Option<Arc<AtomicBool>>,
    pub on_progress: Option<ProgressFn>,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            raise_on_error: true,
            ..Self::default()
        }
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn with_progress(mut self, f: impl Fn(usize, usize) -> bool + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    fn should_continue(&self, done: usize, total: usize) -> bool {
        if self
            .cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return false;
        }
        self.on_progress.as_ref().map_or(true, |f| f(done, total))
    }
}

/// Random and bulk access to the frames of one video stream.
///
/// The reader only keeps the probed [`StreamInfo`]; every access opens its
/// own [`DecodeCursor`], so nothing is held open between calls. Seeking is
/// implemented as decoding from the start, which makes `get_frame(i)` cost
/// O(i) decodes.
pub struct VideoReader {
    info: StreamInfo,
    backend: Box<dyn MediaBackend>,
}

impl VideoReader {
    pub fn with_backend(
        path: impl AsRef<Path>,
        backend: Box<dyn MediaBackend>,
    ) -> Result<Self, VideoError> {
        let info = backend.probe(path.as_ref())?;
        log::info!("{info}");
        Ok(Self { info, backend })
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Estimated number of frames. Decoding may produce fewer.
    pub fn len(&self) -> usize {
        self.info.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_shape(&self) -> [usize; 3] {
        self.info.frame_shape()
    }

    pub fn video_shape(&self) -> [usize; 4] {
        self.info.video_shape()
    }

    pub fn cursor(&self) -> Result<DecodeCursor<'_>, VideoError> {
        DecodeCursor::open(&self.info, self.backend.as_ref())
    }

    /// Iterates over every frame in stream order.
    ///
    /// A stream shorter than its estimate ends with one
    /// [`VideoError::ShortRead`] item.
    pub fn frames(&self) -> Result<Frames<'_>, VideoError> {
        Ok(Frames {
            cursor: self.cursor()?,
        })
    }

    /// Decodes the whole video into a new `(N, 3, H, W)` buffer.
    ///
    /// Returns the number of frames actually filled alongside the buffer.
    /// In lenient mode a truncated or corrupt stream simply yields fewer
    /// frames than [`len`](Self::len).
    pub fn load_all(&self, raise_on_error: bool) -> Result<(usize, Array4<u8>), VideoError> {
        self.load_all_with(&LoadOptions {
            raise_on_error,
            ..LoadOptions::default()
        })
    }

    pub fn load_all_with(&self, options: &LoadOptions) -> Result<(usize, Array4<u8>), VideoError> {
        let mut buffer = Array4::zeros(self.video_shape());
        let read = self.load_into(buffer.view_mut(), options)?;
        Ok((read, buffer))
    }

    /// Decodes the whole video into a caller-supplied buffer.
    ///
    /// Slots past the returned count are left untouched.
    pub fn load_into(
        &self,
        mut dst: ArrayViewMut4<'_, u8>,
        options: &LoadOptions,
    ) -> Result<usize, VideoError> {
        let expected = self.video_shape();
        if dst.shape() != expected {
            return Err(VideoError::shape_mismatch(&expected, dst.shape()));
        }

        let total = self.len();
        let mut cursor = self.cursor()?;
        let mut read = 0;
        for slot in dst.outer_iter_mut() {
            if cursor.is_exhausted() || !options.should_continue(read, total) {
                break;
            }
            match cursor.read(slot) {
                Ok(()) => read += 1,
                Err(e) if !options.raise_on_error && e.is_recoverable() => {
                    log::warn!(
                        "Stopped loading {} after {read} of {total} frames: {e}",
                        self.info.path.display()
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        log::debug!("Loaded {read} of {total} frames");
        Ok(read)
    }

    /// Decodes frame `index`. Negative indices count from the end.
    pub fn get_frame(&self, index: i64) -> Result<Frame, VideoError> {
        let position = self.resolve_index(index)?;
        let mut cursor = self.cursor()?;
        seek(&mut cursor, position)?;

        let mut frame = Frame::blank(self.info.width, self.info.height, position);
        cursor.read(frame.pixels_mut())?;
        Ok(frame)
    }

    /// Decodes the frames selected by `slice` into a `(M, 3, H, W)` buffer,
    /// in slice order.
    ///
    /// Frames are always decoded front to back with a single cursor, even
    /// for negative steps. Any decode failure is surfaced.
    pub fn get_slice(&self, slice: FrameSlice) -> Result<Array4<u8>, VideoError> {
        let indices = slice.indices(self.len())?;
        let [_, channels, height, width] = self.video_shape();
        let mut out = Array4::zeros((indices.len(), channels, height, width));
        if indices.is_empty() {
            return Ok(out);
        }

        let mut order: Vec<(usize, usize)> = indices.into_iter().enumerate().collect();
        order.sort_unstable_by_key(|&(_, position)| position);

        let mut cursor = self.cursor()?;
        for (slot, position) in order {
            seek(&mut cursor, position)?;
            cursor.read(out.index_axis_mut(Axis(0), slot))?;
        }
        Ok(out)
    }

    fn resolve_index(&self, index: i64) -> Result<usize, VideoError> {
        let length = self.len();
        let resolved = if index < 0 {
            index + length as i64
        } else {
            index
        };
        if resolved < 0 || resolved >= length as i64 {
            return Err(VideoError::Index { index, length });
        }
        Ok(resolved as usize)
    }
}

impl fmt::Debug for VideoReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoReader")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Skips forward until the cursor's next frame is `target`.
fn seek(cursor: &mut DecodeCursor<'_>, target: usize) -> Result<(), VideoError> {
    let mut reached = cursor.position().unwrap_or_default();
    while reached < target {
        cursor.advance()?;
        match cursor.position() {
            Some(position) => reached = position,
            None => {
                return Err(VideoError::ShortRead {
                    position: reached,
                    expected: cursor.stream_info().frame_count,
                })
            }
        }
    }
    Ok(())
}

/// Iterator returned by [`VideoReader::frames`].
pub struct Frames<'a> {
    cursor: DecodeCursor<'a>,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame, VideoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor.position()?;
        let info = self.cursor.stream_info();
        let mut frame = Frame::blank(info.width, info.height, index);
        Some(self.cursor.read(frame.pixels_mut()).map(|()| frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor.position() {
            Some(position) => (0, Some(self.cursor.stream_info().frame_count - position)),
            None => (0, Some(0)),
        }
    }
}
