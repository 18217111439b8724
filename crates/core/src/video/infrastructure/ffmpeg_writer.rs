use std::path::Path;

use ffmpeg_next::codec::Codec;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::{codec, media, Dictionary, Packet, Rational};
use ndarray::ArrayView3;

use crate::shared::error::VideoError;
use crate::shared::pixel_layout::planar_to_packed;
use crate::video::domain::media_backend::{EncodeSession, EncodingFormat};
use crate::video::domain::writer_config::WriterConfig;
use crate::video::infrastructure::ffmpeg_probe::ensure_initialized;

/// Encodes RGB frames into a new container via ffmpeg-next.
///
/// The codec and container are taken from the config when given, otherwise
/// derived from the output filename.
pub struct FfmpegEncodeSession {
    output: Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: scaling::Context,
    rgb: VideoFrame,
    format: EncodingFormat,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    next_pts: i64,
    finished: bool,
}

// Safety: a session is owned by exactly one writer and only used from the
// thread currently holding that writer. The raw pointers inside ffmpeg
// types are never shared.
unsafe impl Send for FfmpegEncodeSession {}

impl FfmpegEncodeSession {
    pub fn create(path: &Path, config: &WriterConfig) -> Result<Self, VideoError> {
        ensure_initialized()?;
        let not_writable = |e: ffmpeg_next::Error| VideoError::NotWritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut output = match &config.format {
            Some(name) => ffmpeg_next::format::output_as(path, name),
            None => ffmpeg_next::format::output(path),
        }
        .map_err(not_writable)?;

        let codec = find_encoder(&output, path, config)?;
        let supported: Option<Vec<Pixel>> = codec
            .video()
            .ok()
            .and_then(|video| video.formats().map(|formats| formats.collect()));
        let pixel_format = choose_pixel_format(supported.as_deref());

        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let (num, den) = config.framerate_fraction();
        let encoder_time_base = Rational(den, num);

        let mut encoder_ctx = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| VideoError::Allocation(format!("encoder context: {e}")))?;
        encoder_ctx.set_width(config.width);
        encoder_ctx.set_height(config.height);
        encoder_ctx.set_format(pixel_format);
        encoder_ctx.set_time_base(encoder_time_base);
        encoder_ctx.set_frame_rate(Some(Rational(num, den)));
        encoder_ctx.set_bit_rate(config.bitrate as usize);
        encoder_ctx.set_gop(config.gop);
        if global_header {
            encoder_ctx.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx
            .open_with(Dictionary::new())
            .map_err(|e| VideoError::UnsupportedCodec(format!("{}: {e}", codec.name())))?;

        let stream_index = {
            let mut ost = output
                .add_stream(Some(codec))
                .map_err(|e| VideoError::Allocation(format!("output stream: {e}")))?;
            ost.set_parameters(&encoder);
            ost.set_time_base(encoder_time_base);
            ost.index()
        };

        output.write_header().map_err(not_writable)?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .unwrap_or(encoder_time_base);

        let scaler = scaling::Context::get(
            Pixel::RGB24,
            config.width,
            config.height,
            pixel_format,
            config.width,
            config.height,
            scaling::Flags::BICUBIC,
        )
        .map_err(|e| VideoError::Allocation(format!("color converter: {e}")))?;

        let format = EncodingFormat {
            codec_name: codec.name().to_string(),
            codec_long_name: codec.description().to_string(),
            format_name: output.format().name().to_string(),
            format_long_name: output.format().description().to_string(),
        };
        log::debug!(
            "Encoding {} as {} ({pixel_format:?}) in {}",
            path.display(),
            format.codec_name,
            format.format_name
        );

        Ok(Self {
            output,
            encoder,
            scaler,
            rgb: VideoFrame::new(Pixel::RGB24, config.width, config.height),
            format,
            stream_index,
            encoder_time_base,
            stream_time_base,
            next_pts: 0,
            finished: false,
        })
    }

    /// Moves every packet the encoder has ready into the container.
    fn drain(&mut self) -> Result<(), VideoError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| VideoError::Encode(format!("writing packet: {e}")))?;
        }
        Ok(())
    }
}

impl EncodeSession for FfmpegEncodeSession {
    fn format(&self) -> &EncodingFormat {
        &self.format
    }

    fn encode(&mut self, frame: ArrayView3<'_, u8>) -> Result<(), VideoError> {
        let stride = self.rgb.stride(0);
        planar_to_packed(frame, self.rgb.data_mut(0), stride)?;

        // A fresh picture per frame: the encoder may still hold a reference
        // to the previous one.
        let mut picture = VideoFrame::empty();
        self.scaler
            .run(&self.rgb, &mut picture)
            .map_err(|e| VideoError::Encode(format!("color conversion: {e}")))?;
        picture.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder
            .send_frame(&picture)
            .map_err(|e| VideoError::Encode(e.to_string()))?;
        self.drain()
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.encoder
            .send_eof()
            .map_err(|e| VideoError::Encode(format!("flushing encoder: {e}")))?;
        self.drain()?;
        self.output
            .write_trailer()
            .map_err(|e| VideoError::Encode(format!("writing trailer: {e}")))
    }
}

/// The explicitly named encoder, else the container's default video codec
/// for this filename.
fn find_encoder(output: &Output, path: &Path, config: &WriterConfig) -> Result<Codec, VideoError> {
    let codec = match &config.codec {
        Some(name) => ffmpeg_next::encoder::find_by_name(name)
            .ok_or_else(|| VideoError::UnsupportedCodec(name.clone()))?,
        None => {
            let id = output.format().codec(path, media::Type::Video);
            ffmpeg_next::encoder::find(id)
                .ok_or_else(|| VideoError::UnsupportedCodec(format!("{id:?}")))?
        }
    };
    if !codec.is_video() {
        return Err(VideoError::UnsupportedCodec(format!(
            "{} is not a video codec",
            codec.name()
        )));
    }
    Ok(codec)
}

/// YUV420P whenever the encoder accepts it (or does not say), otherwise the
/// first format it lists.
pub fn choose_pixel_format(supported: Option<&[Pixel]>) -> Pixel {
    match supported {
        Some(formats) if !formats.is_empty() && !formats.contains(&Pixel::YUV420P) => formats[0],
        _ => Pixel::YUV420P,
    }
}
