use std::path::Path;

use crate::shared::error::VideoError;
use crate::shared::stream_info::StreamInfo;
use crate::video::domain::media_backend::{DecodeSession, EncodeSession, MediaBackend};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::domain::writer_config::WriterConfig;
use crate::video::infrastructure::ffmpeg_probe::{self, ensure_initialized};
use crate::video::infrastructure::ffmpeg_reader::FfmpegDecodeSession;
use crate::video::infrastructure::ffmpeg_writer::FfmpegEncodeSession;

/// The FFmpeg libraries (libavformat, libavcodec, libswscale) behind
/// [`MediaBackend`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<StreamInfo, VideoError> {
        ffmpeg_probe::probe(path)
    }

    fn open_decoder(&self, info: &StreamInfo) -> Result<Box<dyn DecodeSession>, VideoError> {
        Ok(Box::new(FfmpegDecodeSession::open(info)?))
    }

    fn open_encoder(
        &self,
        path: &Path,
        config: &WriterConfig,
    ) -> Result<Box<dyn EncodeSession>, VideoError> {
        Ok(Box::new(FfmpegEncodeSession::create(path, config)?))
    }
}

impl VideoReader {
    /// Opens `path` for reading with the FFmpeg backend.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VideoError> {
        Self::with_backend(path, Box::new(FfmpegBackend))
    }
}

impl VideoWriter {
    /// Creates `path` for writing with the FFmpeg backend.
    pub fn create(path: impl AsRef<Path>, config: WriterConfig) -> Result<Self, VideoError> {
        Self::with_backend(path, config, &FfmpegBackend)
    }
}

/// Splits FFmpeg's packed `major << 16 | minor << 8 | micro` version.
fn unpack_version(packed: u32) -> (u32, u32, u32) {
    (packed >> 16, (packed >> 8) & 0xff, packed & 0xff)
}

/// Versions of the linked FFmpeg libraries, one per line.
pub fn library_versions() -> Result<String, VideoError> {
    ensure_initialized()?;
    let libraries = [
        ("libavutil", ffmpeg_next::util::version()),
        ("libavcodec", ffmpeg_next::codec::version()),
        ("libavformat", ffmpeg_next::format::version()),
        ("libswscale", ffmpeg_next::software::scaling::version()),
    ];
    Ok(libraries
        .iter()
        .map(|&(name, packed)| {
            let (major, minor, micro) = unpack_version(packed);
            format!("{name} {major}.{minor}.{micro}")
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::frame_slice::FrameSlice;
    use crate::video::infrastructure::test_media::{grey_level, grey_video, mean_level, silent_wav};
    use ndarray::{Array3, Array4, Axis};

    fn assert_level(pixels: ndarray::ArrayView3<'_, u8>, index: usize) {
        let level = mean_level(pixels);
        assert!(
            (level - grey_level(index) as f64).abs() < 8.0,
            "expected frame {index} (level {}), got mean {level}",
            grey_level(index)
        );
    }

    #[test]
    fn test_unpack_version() {
        assert_eq!(unpack_version((60 << 16) | (3 << 8) | 100), (60, 3, 100));
    }

    #[test]
    fn test_library_versions_lists_each_library() {
        let versions = library_versions().unwrap();
        assert_eq!(versions.lines().count(), 4);
        assert!(versions.contains("libavcodec "));
    }

    #[test]
    fn test_ten_frame_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ten.mp4");
        grey_video(&path, 10, 64, 48);

        let reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.len(), 10);
        assert_eq!(reader.video_shape(), [10, 3, 48, 64]);

        let last = reader.get_frame(-1).unwrap();
        assert_eq!(last.pixels(), reader.get_frame(9).unwrap().pixels());
        assert_level(last.pixels(), 9);

        let slice = reader
            .get_slice(FrameSlice::new(Some(2), Some(8), Some(2)))
            .unwrap();
        assert_eq!(slice.shape(), &[3, 3, 48, 64]);
        for (slot, position) in [2, 4, 6].into_iter().enumerate() {
            assert_level(slice.index_axis(Axis(0), slot), position);
        }

        assert!(matches!(
            reader.get_frame(10),
            Err(VideoError::Index { index: 10, length: 10 })
        ));
    }

    #[test]
    fn test_negative_indices_mirror_positive_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.mp4");
        grey_video(&path, 10, 64, 48);

        let reader = VideoReader::open(&path).unwrap();
        let len = reader.len() as i64;
        for i in 0..len {
            let forward = reader.get_frame(i).unwrap();
            let backward = reader.get_frame(i - len).unwrap();
            assert_eq!(backward.index(), forward.index());
            assert_eq!(backward.pixels(), forward.pixels());
        }
        assert!(matches!(
            reader.get_frame(-len - 1),
            Err(VideoError::Index { .. })
        ));
    }

    #[test]
    fn test_full_slice_matches_cursor_walk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.mp4");
        grey_video(&path, 7, 32, 32);

        let reader = VideoReader::open(&path).unwrap();
        let len = reader.len() as i64;
        let slice = reader
            .get_slice(FrameSlice::new(Some(0), Some(len), Some(1)))
            .unwrap();

        let mut cursor = reader.cursor().unwrap();
        let mut walked = Vec::new();
        while !cursor.is_exhausted() {
            let mut frame = Array3::zeros(reader.frame_shape());
            cursor.read(frame.view_mut()).unwrap();
            walked.push(frame);
        }

        assert_eq!(walked.len(), slice.len_of(Axis(0)));
        for (i, frame) in walked.iter().enumerate() {
            assert_eq!(slice.index_axis(Axis(0), i), frame.view());
        }
    }

    #[test]
    fn test_audio_only_file_has_no_video_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        silent_wav(&path, 4000);
        assert!(matches!(
            VideoReader::open(&path),
            Err(VideoError::NoVideoStream(_))
        ));
    }

    #[test]
    fn test_eleventh_frame_exists_in_eleven_frame_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eleven.mp4");
        grey_video(&path, 11, 64, 48);

        let reader = VideoReader::open(&path).unwrap();
        let frame = reader.get_frame(10).unwrap();
        assert_eq!(frame.index(), 10);
        assert_level(frame.pixels(), 10);
    }

    #[test]
    fn test_load_all_matches_frame_access() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.mp4");
        grey_video(&path, 6, 32, 32);

        let reader = VideoReader::open(&path).unwrap();
        let (read, video) = reader.load_all(true).unwrap();
        assert_eq!(read, reader.len());
        assert_eq!(video.index_axis(Axis(0), 4), reader.get_frame(4).unwrap().pixels());
        for (i, frame) in reader.frames().unwrap().enumerate() {
            assert_eq!(frame.unwrap().pixels(), video.index_axis(Axis(0), i));
        }
    }

    #[test]
    fn test_writer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.mp4");
        let config = WriterConfig::new(64, 48)
            .with_codec("mpeg4")
            .with_bitrate(4_000_000)
            .with_framerate(30.0);
        let mut writer = VideoWriter::create(&path, config).unwrap();
        assert_eq!(writer.codec_name(), "mpeg4");

        let batch = Array4::from_shape_fn((4, 3, 48, 64), |(i, _, _, _)| grey_level(i));
        writer.append_batch(batch.view()).unwrap();
        writer
            .append(Array3::from_elem((3, 48, 64), grey_level(4)).view())
            .unwrap();
        assert_eq!(writer.len(), 5);
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(!writer.is_opened());

        let reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.len(), 5);
        assert!((reader.info().frame_rate - 30.0).abs() < 1e-6);
        let (read, video) = reader.load_all(true).unwrap();
        assert_eq!(read, 5);
        for i in 0..5 {
            assert_level(video.index_axis(Axis(0), i), i);
        }
    }

    #[test]
    fn test_dropped_writer_leaves_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.avi");
        {
            let mut writer = VideoWriter::create(&path, WriterConfig::new(32, 32)).unwrap();
            for i in 0..3 {
                writer
                    .append(Array3::from_elem((3, 32, 32), grey_level(i)).view())
                    .unwrap();
            }
        }

        let reader = VideoReader::open(&path).unwrap();
        let (read, _) = reader.load_all(false).unwrap();
        assert_eq!(read, 3);
    }

    #[test]
    fn test_odd_geometry_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.mp4");
        assert!(matches!(
            VideoWriter::create(&path, WriterConfig::new(63, 48)),
            Err(VideoError::Geometry { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            VideoReader::open("/nonexistent/clip.mp4"),
            Err(VideoError::NotReadable { .. })
        ));
    }
}
