pub mod constants;
pub mod error;
pub mod frame;
pub mod pixel_layout;
pub mod stream_info;
