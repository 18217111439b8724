pub mod shared;
pub mod video;
