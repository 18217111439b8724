use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::shared::constants::{CHANNELS, MICROSECONDS_PER_SECOND};

/// Static properties of the video stream selected from a container.
///
/// Produced once by the probe and never mutated afterwards. `frame_count`
/// is an estimate: decoding may yield fewer frames, never more.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    /// Total duration in microseconds.
    pub duration_us: u64,
    pub frame_rate: f64,
    /// Stream time base as `(numerator, denominator)`, after normalization.
    pub time_base: (i32, i32),
    pub codec_name: String,
    pub codec_long_name: String,
    pub format_name: String,
    pub format_long_name: String,
}

impl StreamInfo {
    /// Shape of one decoded frame: `[3, height, width]`.
    pub fn frame_shape(&self) -> [usize; 3] {
        [CHANNELS, self.height as usize, self.width as usize]
    }

    /// Shape of the whole video: `[frame_count, 3, height, width]`.
    pub fn video_shape(&self) -> [usize; 4] {
        let [c, h, w] = self.frame_shape();
        [self.frame_count, c, h, w]
    }

    /// Bytes in one decoded frame.
    pub fn frame_size(&self) -> usize {
        self.frame_shape().iter().product()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration_us)
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video file: {}; Format: {} ({}); Codec: {} ({}); Time: {:.2} s ({} @ {:.2}Hz); Size (w x h): {} x {} pixels",
            self.path.display(),
            self.format_long_name,
            self.format_name,
            self.codec_long_name,
            self.codec_name,
            self.duration_us as f64 / MICROSECONDS_PER_SECOND,
            self.frame_count,
            self.frame_rate,
            self.width,
            self.height,
        )
    }
}

/// Frame count estimate: the container's own count when it reports one,
/// otherwise `round(duration × frame_rate)`.
pub fn estimate_frame_count(reported: i64, duration_us: u64, frame_rate: f64) -> usize {
    if reported > 0 {
        return reported as usize;
    }
    if frame_rate <= 0.0 || !frame_rate.is_finite() {
        return 0;
    }
    let seconds = duration_us as f64 / MICROSECONDS_PER_SECOND;
    (seconds * frame_rate).round() as usize
}

#[cfg(test)]
pub(crate) fn sample_info(frame_count: usize, width: u32, height: u32) -> StreamInfo {
    StreamInfo {
        path: PathBuf::from("/tmp/sample.mp4"),
        width,
        height,
        frame_count,
        duration_us: (frame_count as u64) * 40_000,
        frame_rate: 25.0,
        time_base: (1, 12800),
        codec_name: "mpeg4".to_string(),
        codec_long_name: "MPEG-4 part 2".to_string(),
        format_name: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
        format_long_name: "QuickTime / MOV".to_string(),
    }
}
