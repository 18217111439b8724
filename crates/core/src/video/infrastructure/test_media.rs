//! Synthetic clips for the FFmpeg adapter tests.

use std::path::Path;

use ndarray::Array3;

use crate::video::domain::video_writer::VideoWriter;
use crate::video::domain::writer_config::WriterConfig;

/// Flat grey level of frame `index` in clips made by [`grey_video`].
pub(crate) fn grey_level(index: usize) -> u8 {
    ((index * 20) % 240 + 10) as u8
}

/// Writes an MPEG-4 clip at 25 fps whose frame `i` is filled with
/// `grey_level(i)`.
pub(crate) fn grey_video(path: &Path, frames: usize, width: u32, height: u32) {
    let config = WriterConfig::new(width, height)
        .with_codec("mpeg4")
        .with_bitrate(4_000_000);
    let mut writer = VideoWriter::create(path, config).unwrap();
    for i in 0..frames {
        let frame = Array3::from_elem((3, height as usize, width as usize), grey_level(i));
        writer.append(frame.view()).unwrap();
    }
    writer.close().unwrap();
}

/// Mean pixel value of a decoded frame.
pub(crate) fn mean_level(pixels: ndarray::ArrayView3<'_, u8>) -> f64 {
    pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64
}

/// Writes a mono 16-bit PCM WAV file of `samples` silent samples at 8 kHz:
/// a readable container without any video stream.
pub(crate) fn silent_wav(path: &Path, samples: u32) {
    let data_len = samples * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&8000u32.to_le_bytes());
    bytes.extend_from_slice(&16000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    std::fs::write(path, bytes).unwrap();
}
