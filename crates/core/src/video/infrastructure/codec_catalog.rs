use std::os::raw::c_int;

use ffmpeg_next::codec::{Capabilities, Codec};
use ffmpeg_next::ffi;
use serde::Serialize;

use crate::shared::error::VideoError;
use crate::video::infrastructure::ffmpeg_probe::ensure_initialized;

/// What the linked FFmpeg build knows about one codec.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CodecDescription {
    pub name: String,
    pub long_name: String,
    pub id: String,
    /// Empty when the codec accepts any format or is not a video codec.
    pub pixel_formats: Vec<String>,
    /// Empty when the codec accepts any rate.
    pub frame_rates: Vec<f64>,
    pub lossless: bool,
    pub experimental: bool,
    pub delay: bool,
    pub hardware_accelerated: bool,
    pub encode: bool,
    pub decode: bool,
}

pub fn describe_encoder(name: &str) -> Result<CodecDescription, VideoError> {
    ensure_initialized()?;
    ffmpeg_next::encoder::find_by_name(name)
        .map(describe)
        .ok_or_else(|| VideoError::UnsupportedCodec(name.to_string()))
}

pub fn describe_decoder(name: &str) -> Result<CodecDescription, VideoError> {
    ensure_initialized()?;
    ffmpeg_next::decoder::find_by_name(name)
        .map(describe)
        .ok_or_else(|| VideoError::UnsupportedCodec(name.to_string()))
}

fn describe(codec: Codec) -> CodecDescription {
    let (pixel_formats, frame_rates) = match codec.video() {
        Ok(video) => (
            video
                .formats()
                .map(|formats| {
                    formats
                        .map(|pixel| format!("{pixel:?}").to_lowercase())
                        .collect()
                })
                .unwrap_or_default(),
            video
                .rates()
                .map(|rates| rates.map(f64::from).collect())
                .unwrap_or_default(),
        ),
        Err(_) => (Vec::new(), Vec::new()),
    };
    let capabilities = codec.capabilities();
    let (raw_capabilities, properties) = raw_flags(&codec);

    CodecDescription {
        name: codec.name().to_string(),
        long_name: codec.description().to_string(),
        id: format!("{:?}", codec.id()),
        pixel_formats,
        frame_rates,
        lossless: (properties & ffi::AV_CODEC_PROP_LOSSLESS as c_int) != 0,
        experimental: capabilities.contains(Capabilities::EXPERIMENTAL),
        delay: capabilities.contains(Capabilities::DELAY),
        hardware_accelerated: (raw_capabilities & ffi::AV_CODEC_CAP_HARDWARE as c_int) != 0,
        encode: codec.is_encoder(),
        decode: codec.is_decoder(),
    }
}

/// The codec's raw `AV_CODEC_CAP_*` bits and its descriptor's
/// `AV_CODEC_PROP_*` bits. Neither set is fully exposed by the safe
/// wrappers across FFmpeg versions.
fn raw_flags(codec: &Codec) -> (c_int, c_int) {
    // Safety: `codec` wraps a static AVCodec registered with libavcodec, and
    // avcodec_descriptor_get returns either null or a static descriptor.
    unsafe {
        let capabilities = (*codec.as_ptr()).capabilities;
        let descriptor = ffi::avcodec_descriptor_get(codec.id().into());
        let properties = if descriptor.is_null() {
            0
        } else {
            (*descriptor).props
        };
        (capabilities, properties)
    }
}
