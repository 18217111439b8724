pub mod decode_cursor;
pub mod frame_slice;
pub mod image_writer;
pub mod media_backend;
pub mod video_reader;
pub mod video_writer;
pub mod writer_config;

#[cfg(test)]
pub(crate) mod test_support;
