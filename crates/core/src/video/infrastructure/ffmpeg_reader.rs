use ffmpeg_next::error::EAGAIN;
use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ndarray::ArrayViewMut3;

use crate::shared::error::VideoError;
use crate::shared::pixel_layout::packed_to_planar;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::media_backend::DecodeSession;
use crate::video::infrastructure::ffmpeg_probe::{
    ensure_initialized, first_video_stream, open_input, open_video_decoder,
};

/// Decodes the first video stream of a file via ffmpeg-next
/// (libavformat + libavcodec), converting pictures to RGB24 on demand.
///
/// Each session owns its own file handle, decoder and converter.
pub struct FfmpegDecodeSession {
    input: Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    decoded: VideoFrame,
    rgb: VideoFrame,
    stream_index: usize,
    flushing: bool,
}

// Safety: a session is owned by exactly one cursor and only used from the
// thread currently holding that cursor. The raw pointers inside ffmpeg
// types are never shared.
unsafe impl Send for FfmpegDecodeSession {}

impl FfmpegDecodeSession {
    pub fn open(info: &StreamInfo) -> Result<Self, VideoError> {
        ensure_initialized()?;
        let input = open_input(&info.path)?;
        let (stream_index, parameters) = {
            let stream = first_video_stream(&input)
                .ok_or_else(|| VideoError::NoVideoStream(info.path.clone()))?;
            (stream.index(), stream.parameters())
        };
        let decoder = open_video_decoder(parameters)?;

        // Output geometry comes from the probe so every picture fits the
        // caller's (3, H, W) buffers.
        let scaler = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            info.width,
            info.height,
            scaling::Flags::BICUBIC,
        )
        .map_err(|e| VideoError::Allocation(format!("color converter: {e}")))?;

        Ok(Self {
            input,
            decoder,
            scaler,
            decoded: VideoFrame::empty(),
            rgb: VideoFrame::new(Pixel::RGB24, info.width, info.height),
            stream_index,
            flushing: false,
        })
    }

    /// Pulls the next complete picture out of the decoder, feeding it
    /// packets as needed. Returns `false` once fully drained.
    fn receive_picture(&mut self) -> Result<bool, VideoError> {
        loop {
            match classify_receive(self.decoder.receive_frame(&mut self.decoded))? {
                Receive::Picture => return Ok(true),
                Receive::Drained => return Ok(false),
                Receive::NeedsInput if self.flushing => return Ok(false),
                Receive::NeedsInput => self.feed()?,
            }
        }
    }

    /// Sends the next packet of our stream to the decoder, or end-of-stream
    /// when the container has none left.
    fn feed(&mut self) -> Result<(), VideoError> {
        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                self.decoder
                    .send_eof()
                    .map_err(|e| VideoError::Decode(format!("flushing decoder: {e}")))?;
                self.flushing = true;
                return Ok(());
            };

            if stream.index() != self.stream_index {
                continue;
            }

            match self.decoder.send_packet(&packet) {
                Ok(()) => return Ok(()),
                Err(e) => log::debug!("Skipping undecodable packet: {e}"),
            }
        }
    }
}

impl DecodeSession for FfmpegDecodeSession {
    fn decode_next(&mut self, dst: Option<ArrayViewMut3<'_, u8>>) -> Result<bool, VideoError> {
        if !self.receive_picture()? {
            return Ok(false);
        }
        if let Some(dst) = dst {
            self.scaler
                .run(&self.decoded, &mut self.rgb)
                .map_err(|e| VideoError::Decode(format!("color conversion: {e}")))?;
            packed_to_planar(self.rgb.data(0), self.rgb.stride(0), dst)?;
        }
        Ok(true)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Receive {
    Picture,
    NeedsInput,
    Drained,
}

/// Maps a `receive_frame` result. Only EAGAIN and end-of-stream are part of
/// the normal decode loop; any other error is a decode failure.
fn classify_receive(result: Result<(), ffmpeg_next::Error>) -> Result<Receive, VideoError> {
    match result {
        Ok(()) => Ok(Receive::Picture),
        Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => Ok(Receive::NeedsInput),
        Err(ffmpeg_next::Error::Eof) => Ok(Receive::Drained),
        Err(e) => Err(VideoError::Decode(e.to_string())),
    }
}
