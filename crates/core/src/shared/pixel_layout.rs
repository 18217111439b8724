//! Copies between the decoder's packed RGB24 rows and channel-major arrays.
//!
//! FFmpeg lays a picture out as `(height, width, band)` with optional row
//! padding (`stride >= width * 3`). There is no way to ask it for a
//! different layout, so every frame crossing the boundary is transposed.

use ndarray::{ArrayView3, ArrayViewMut3, ShapeBuilder};

use crate::shared::constants::CHANNELS;
use crate::shared::error::VideoError;

/// Transposes a packed RGB24 picture into a `(3, height, width)` buffer.
pub fn packed_to_planar(
    src: &[u8],
    stride: usize,
    mut dst: ArrayViewMut3<'_, u8>,
) -> Result<(), VideoError> {
    let (_, height, width) = dst.dim();
    let shape = (height, width, CHANNELS).strides((stride, CHANNELS, 1));
    let packed = ArrayView3::from_shape(shape, src).map_err(|e| {
        VideoError::Decode(format!("picture buffer does not match frame size: {e}"))
    })?;
    dst.assign(&packed.permuted_axes([2, 0, 1]));
    Ok(())
}

/// Transposes a `(3, height, width)` buffer into a packed RGB24 picture.
pub fn planar_to_packed(
    src: ArrayView3<'_, u8>,
    dst: &mut [u8],
    stride: usize,
) -> Result<(), VideoError> {
    let (_, height, width) = src.dim();
    let shape = (height, width, CHANNELS).strides((stride, CHANNELS, 1));
    let mut packed = ArrayViewMut3::from_shape(shape, dst).map_err(|e| {
        VideoError::Encode(format!("picture buffer does not match frame size: {e}"))
    })?;
    packed.assign(&src.permuted_axes([1, 2, 0]));
    Ok(())
}
