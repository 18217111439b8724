use std::fmt;

use ndarray::ArrayViewMut3;

use crate::shared::error::VideoError;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::media_backend::{DecodeSession, MediaBackend};

/// A forward-only decoding position over one video stream.
///
/// An open cursor exclusively owns a decode session (container handle,
/// codec context, picture buffers, color-space converter). Reaching the end
/// of the stream, failing to decode, or calling [`reset`](Self::reset) drops
/// that session and leaves the cursor exhausted, which is the one and only
/// "past the end" state.
///
/// Cursors are not `Clone`: duplicating one means opening a brand new
/// session and replaying it up to the same position, see
/// [`try_clone`](Self::try_clone).
pub struct DecodeCursor<'a> {
    info: &'a StreamInfo,
    backend: &'a dyn MediaBackend,
    state: CursorState,
}

enum CursorState {
    Open {
        session: Box<dyn DecodeSession>,
        position: usize,
    },
    Exhausted,
}

impl<'a> DecodeCursor<'a> {
    /// Acquires a fresh session positioned before the first frame.
    pub fn open(info: &'a StreamInfo, backend: &'a dyn MediaBackend) -> Result<Self, VideoError> {
        let session = backend.open_decoder(info)?;
        log::debug!("Opened decode session on {}", info.path.display());

        let mut cursor = Self {
            info,
            backend,
            state: CursorState::Open {
                session,
                position: 0,
            },
        };
        if info.frame_count == 0 {
            cursor.reset();
        }
        Ok(cursor)
    }

    pub fn stream_info(&self) -> &'a StreamInfo {
        self.info
    }

    /// Index of the next frame to be decoded, or `None` once exhausted.
    pub fn position(&self) -> Option<usize> {
        match self.state {
            CursorState::Open { position, .. } => Some(position),
            CursorState::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }

    /// Decodes the next frame into `dst`, which must have the stream's
    /// `(3, height, width)` shape, and moves one frame forward.
    ///
    /// Fails with [`VideoError::ShortRead`] when the container runs out of
    /// pictures before the estimated frame count is reached.
    pub fn read(&mut self, dst: ArrayViewMut3<'_, u8>) -> Result<(), VideoError> {
        let expected = self.info.frame_shape();
        if dst.shape() != expected {
            return Err(VideoError::shape_mismatch(&expected, dst.shape()));
        }

        let position = self.require_open()?;
        if self.step(Some(dst))? {
            Ok(())
        } else {
            Err(VideoError::ShortRead {
                position,
                expected: self.info.frame_count,
            })
        }
    }

    /// Moves one frame forward without converting the picture.
    ///
    /// Running out of pictures here is not an error, the cursor simply
    /// becomes exhausted.
    pub fn advance(&mut self) -> Result<(), VideoError> {
        self.require_open()?;
        self.step(None).map(|_| ())
    }

    /// Moves up to `n` frames forward. Stopping early because the stream
    /// ended is the expected outcome of asking for more frames than remain.
    pub fn advance_by(&mut self, n: usize) -> Result<(), VideoError> {
        for _ in 0..n {
            if self.is_exhausted() {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Releases the session. Safe to call in any state.
    pub fn reset(&mut self) {
        if let CursorState::Open { position, .. } = self.state {
            log::debug!(
                "Releasing decode session on {} at frame {position}",
                self.info.path.display()
            );
        }
        self.state = CursorState::Exhausted;
    }

    /// Duplicates the cursor by opening a new session and replaying it to
    /// the same position. Costs O(position) decodes.
    pub fn try_clone(&self) -> Result<Self, VideoError> {
        match self.position() {
            None => Ok(Self {
                info: self.info,
                backend: self.backend,
                state: CursorState::Exhausted,
            }),
            Some(position) => {
                let mut cursor = Self::open(self.info, self.backend)?;
                cursor.advance_by(position)?;
                Ok(cursor)
            }
        }
    }

    fn require_open(&self) -> Result<usize, VideoError> {
        self.position().ok_or(VideoError::Index {
            index: self.info.frame_count as i64,
            length: self.info.frame_count,
        })
    }

    /// Decodes one picture. Returns `false` if the container was exhausted
    /// first. Every outcome other than a picture short of the estimate
    /// leaves the cursor exhausted.
    fn step(&mut self, dst: Option<ArrayViewMut3<'_, u8>>) -> Result<bool, VideoError> {
        let length = self.info.frame_count;
        let CursorState::Open { session, position } = &mut self.state else {
            return Ok(false);
        };

        match session.decode_next(dst) {
            Ok(true) => {
                *position += 1;
                if *position >= length {
                    self.reset();
                }
                Ok(true)
            }
            Ok(false) => {
                log::warn!(
                    "{} ran out of pictures at frame {} of an estimated {length}",
                    self.info.path.display(),
                    position
                );
                self.reset();
                Ok(false)
            }
            Err(e) => {
                log::debug!("Decoding stopped at frame {position}: {e}");
                self.reset();
                Err(e)
            }
        }
    }
}

impl PartialEq for DecodeCursor<'_> {
    /// Cursors over the same stream are equal when both are exhausted, or
    /// both are open at the same position.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.info, other.info) && self.position() == other.position()
    }
}

impl fmt::Debug for DecodeCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeCursor")
            .field("path", &self.info.path)
            .field("position", &self.position())
            .finish()
    }
}
