use std::path::Path;
use std::sync::OnceLock;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::stream::Stream;
use ffmpeg_next::{codec, media, Rational};

use crate::shared::constants::{MICROSECONDS_PER_SECOND, TIME_BASE_QUIRK_THRESHOLD};
use crate::shared::error::VideoError;
use crate::shared::stream_info::{estimate_frame_count, StreamInfo};

/// Initializes the FFmpeg libraries once per process and lowers their own
/// logging to errors only.
pub(crate) fn ensure_initialized() -> Result<(), VideoError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    INIT.get_or_init(|| {
        ffmpeg_next::init().map_err(|e| e.to_string())?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
        Ok(())
    })
    .clone()
    .map_err(|e| VideoError::Allocation(format!("media libraries: {e}")))
}

pub(crate) fn open_input(path: &Path) -> Result<Input, VideoError> {
    ffmpeg_next::format::input(path).map_err(|e| VideoError::NotReadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The first video stream in container order. Other stream kinds are
/// ignored entirely.
pub(crate) fn first_video_stream(input: &Input) -> Option<Stream<'_>> {
    input
        .streams()
        .find(|stream| stream.parameters().medium() == media::Type::Video)
}

/// Opens a decoder for the stream's codec.
pub(crate) fn open_video_decoder(
    parameters: codec::Parameters,
) -> Result<ffmpeg_next::decoder::Video, VideoError> {
    let id = parameters.id();
    if ffmpeg_next::decoder::find(id).is_none() {
        return Err(VideoError::UnsupportedCodec(format!("{id:?}")));
    }
    let context = codec::context::Context::from_parameters(parameters)
        .map_err(|e| VideoError::Allocation(format!("codec context: {e}")))?;
    context
        .decoder()
        .video()
        .map_err(|e| VideoError::UnsupportedCodec(format!("{id:?}: {e}")))
}

/// Some containers report the frame rate as the time base (e.g. `25000/1`).
/// Those are reinterpreted as milliseconds.
pub fn normalize_time_base(num: i32, den: i32) -> (i32, i32) {
    if num > TIME_BASE_QUIRK_THRESHOLD && den == 1 {
        (num, 1000)
    } else {
        (num, den)
    }
}

fn rational_to_f64(r: Rational) -> Option<f64> {
    (r.numerator() > 0 && r.denominator() > 0)
        .then(|| r.numerator() as f64 / r.denominator() as f64)
}

/// Stream duration in time-base units converted to microseconds.
fn stream_duration_us(duration: i64, time_base: (i32, i32)) -> u64 {
    let (num, den) = time_base;
    if duration <= 0 || num <= 0 || den <= 0 {
        return 0;
    }
    (duration as f64 * num as f64 / den as f64 * MICROSECONDS_PER_SECOND).round() as u64
}

/// Reads the static properties of the first video stream in `path`.
///
/// Everything opened here is released before returning.
pub fn probe(path: &Path) -> Result<StreamInfo, VideoError> {
    ensure_initialized()?;
    let input = open_input(path)?;
    let stream =
        first_video_stream(&input).ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))?;
    let decoder = open_video_decoder(stream.parameters())?;

    let tb = stream.time_base();
    let time_base = normalize_time_base(tb.numerator(), tb.denominator());

    let duration_us = if input.duration() > 0 {
        input.duration() as u64
    } else {
        stream_duration_us(stream.duration(), time_base)
    };

    let frame_rate = rational_to_f64(stream.rate())
        .or_else(|| rational_to_f64(stream.avg_frame_rate()))
        .unwrap_or_else(|| {
            if duration_us > 0 {
                stream.frames().max(0) as f64 * MICROSECONDS_PER_SECOND / duration_us as f64
            } else {
                0.0
            }
        });

    let (codec_name, codec_long_name) = decoder
        .codec()
        .map(|c| (c.name().to_string(), c.description().to_string()))
        .unwrap_or_default();

    let info = StreamInfo {
        path: path.to_path_buf(),
        width: decoder.width(),
        height: decoder.height(),
        frame_count: estimate_frame_count(stream.frames(), duration_us, frame_rate),
        duration_us,
        frame_rate,
        time_base,
        codec_name,
        codec_long_name,
        format_name: input.format().name().to_string(),
        format_long_name: input.format().description().to_string(),
    };
    log::debug!(
        "Probed {}: stream #{} of {} streams",
        path.display(),
        stream.index(),
        input.nb_streams()
    );
    Ok(info)
}
