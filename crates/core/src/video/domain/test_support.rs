//! In-memory backend used by the domain tests.
//!
//! Decoded pictures are filled with their own position (mod 256), which
//! makes ordering visible in assertions.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ndarray::{Array3, ArrayView3, ArrayViewMut3};

use crate::shared::error::VideoError;
use crate::shared::stream_info::{sample_info, StreamInfo};
use crate::video::domain::media_backend::{
    DecodeSession, EncodeSession, EncodingFormat, MediaBackend,
};
use crate::video::domain::writer_config::WriterConfig;

pub(crate) const WIDTH: u32 = 8;
pub(crate) const HEIGHT: u32 = 6;

#[derive(Default)]
pub(crate) struct Counters {
    pub opened: AtomicUsize,
    pub live: AtomicUsize,
    pub converted: AtomicUsize,
    pub finished: AtomicUsize,
}

pub(crate) struct StubBackend {
    /// Frame count the probe reports.
    pub estimate: usize,
    /// Pictures actually present in the "container".
    pub decodable: usize,
    /// Position at which decoding fails, if any.
    pub fail_at: Option<usize>,
    pub fail_finish: bool,
    pub counters: Arc<Counters>,
    pub encoded: Arc<Mutex<Vec<Array3<u8>>>>,
}

impl StubBackend {
    pub fn new(frames: usize) -> Self {
        Self {
            estimate: frames,
            decodable: frames,
            fail_at: None,
            fail_finish: false,
            counters: Arc::new(Counters::default()),
            encoded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reports `estimate` frames but only `decodable` decode.
    pub fn truncated(estimate: usize, decodable: usize) -> Self {
        Self {
            estimate,
            decodable,
            ..Self::new(estimate)
        }
    }

    pub fn failing_at(frames: usize, position: usize) -> Self {
        Self {
            fail_at: Some(position),
            ..Self::new(frames)
        }
    }

    pub fn info(&self) -> StreamInfo {
        sample_info(self.estimate, WIDTH, HEIGHT)
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn converted(&self) -> usize {
        self.counters.converted.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.counters.finished.load(Ordering::SeqCst)
    }
}

impl MediaBackend for StubBackend {
    fn probe(&self, path: &Path) -> Result<StreamInfo, VideoError> {
        if path.to_str() == Some("/missing.mp4") {
            return Err(VideoError::NotReadable {
                path: path.to_path_buf(),
                reason: "No such file or directory".to_string(),
            });
        }
        Ok(StreamInfo {
            path: path.to_path_buf(),
            ..self.info()
        })
    }

    fn open_decoder(&self, _info: &StreamInfo) -> Result<Box<dyn DecodeSession>, VideoError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubDecodeSession {
            next: 0,
            decodable: self.decodable,
            fail_at: self.fail_at,
            counters: self.counters.clone(),
        }))
    }

    fn open_encoder(
        &self,
        _path: &Path,
        config: &WriterConfig,
    ) -> Result<Box<dyn EncodeSession>, VideoError> {
        Ok(Box::new(StubEncodeSession {
            format: EncodingFormat {
                codec_name: config.codec.clone().unwrap_or_else(|| "stub".to_string()),
                codec_long_name: "Stub codec".to_string(),
                format_name: config.format.clone().unwrap_or_else(|| "stub".to_string()),
                format_long_name: "Stub container".to_string(),
            },
            encoded: self.encoded.clone(),
            counters: self.counters.clone(),
            fail_finish: self.fail_finish,
        }))
    }
}

struct StubDecodeSession {
    next: usize,
    decodable: usize,
    fail_at: Option<usize>,
    counters: Arc<Counters>,
}

impl DecodeSession for StubDecodeSession {
    fn decode_next(&mut self, dst: Option<ArrayViewMut3<'_, u8>>) -> Result<bool, VideoError> {
        if self.fail_at == Some(self.next) {
            return Err(VideoError::Decode(format!("corrupt picture {}", self.next)));
        }
        if self.next >= self.decodable {
            return Ok(false);
        }
        if let Some(mut dst) = dst {
            dst.fill((self.next % 256) as u8);
            self.counters.converted.fetch_add(1, Ordering::SeqCst);
        }
        self.next += 1;
        Ok(true)
    }
}

impl Drop for StubDecodeSession {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct StubEncodeSession {
    format: EncodingFormat,
    encoded: Arc<Mutex<Vec<Array3<u8>>>>,
    counters: Arc<Counters>,
    fail_finish: bool,
}

impl EncodeSession for StubEncodeSession {
    fn format(&self) -> &EncodingFormat {
        &self.format
    }

    fn encode(&mut self, frame: ArrayView3<'_, u8>) -> Result<(), VideoError> {
        self.encoded.lock().unwrap().push(frame.to_owned());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        self.counters.finished.fetch_add(1, Ordering::SeqCst);
        if self.fail_finish {
            return Err(VideoError::Encode("trailer write failed".to_string()));
        }
        Ok(())
    }
}
