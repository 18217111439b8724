use crate::shared::constants::{DEFAULT_BITRATE, DEFAULT_FRAMERATE, DEFAULT_GOP};
use crate::shared::error::VideoError;

/// Encoding parameters for a [`VideoWriter`](super::video_writer::VideoWriter).
///
/// Codec and container format are derived from the output filename unless
/// set explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct WriterConfig {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    /// Bits per second, a hint to the encoder.
    pub bitrate: u64,
    /// Group-of-pictures size.
    pub gop: u32,
    pub codec: Option<String>,
    pub format: Option<String>,
}

impl WriterConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            framerate: DEFAULT_FRAMERATE,
            bitrate: DEFAULT_BITRATE,
            gop: DEFAULT_GOP,
            codec: None,
            format: None,
        }
    }

    pub fn with_framerate(mut self, framerate: f64) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_gop(mut self, gop: u32) -> Self {
        self.gop = gop;
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Codecs work on 2x2 chroma blocks, so both dimensions must be even.
    pub fn validate_geometry(&self) -> Result<(), VideoError> {
        let valid = |d: u32| d > 0 && d % 2 == 0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(VideoError::Geometry {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Frame rate as an exact fraction. Integral rates map to `n/1`, anything
    /// else is expressed over 1001 so NTSC-style rates stay exact. The
    /// numerator is never below 1, so rates under 1/1001 fps are raised.
    pub fn framerate_fraction(&self) -> (i32, i32) {
        let rate = if self.framerate > 0.0 && self.framerate.is_finite() {
            self.framerate
        } else {
            DEFAULT_FRAMERATE
        };
        if (rate - rate.round()).abs() < 1e-9 {
            (rate.round() as i32, 1)
        } else {
            (((rate * 1001.0).round() as i32).max(1), 1001)
        }
    }
}
