/// Frame rate used by the writer when none is given.
pub const DEFAULT_FRAMERATE: f64 = 25.0;

/// Bit rate hint, in bits per second, handed to the encoder by default.
pub const DEFAULT_BITRATE: u64 = 1_500_000;

/// Default distance between key frames.
pub const DEFAULT_GOP: u32 = 12;

/// Time bases with a numerator above this and a denominator of 1 are
/// rewritten to `num/1000`. Some encoders emit them and they make duration
/// and frame rate arithmetic overflow.
pub const TIME_BASE_QUIRK_THRESHOLD: i32 = 1000;

pub const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// RGB: one plane per band in the decoded buffers.
pub const CHANNELS: usize = 3;
