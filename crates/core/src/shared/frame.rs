use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis};

use crate::shared::constants::CHANNELS;

/// One decoded video frame in channel-major RGB: shape `(3, height, width)`.
///
/// Each color band is contiguous, which is the opposite of what the decoder
/// produces; the transposition happens at the I/O boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
    index: usize,
}

impl Frame {
    pub fn new(pixels: Array3<u8>, index: usize) -> Self {
        debug_assert_eq!(
            pixels.len_of(Axis(0)),
            CHANNELS,
            "frame must have exactly 3 color bands"
        );
        Self { pixels, index }
    }

    /// A zero-filled frame ready to be decoded into.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        Self::new(
            Array3::zeros((CHANNELS, height as usize, width as usize)),
            index,
        )
    }

    pub fn width(&self) -> u32 {
        self.pixels.len_of(Axis(2)) as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.len_of(Axis(1)) as u32
    }

    pub fn channels(&self) -> u8 {
        self.pixels.len_of(Axis(0)) as u8
    }

    /// Position of this frame in the stream it was decoded from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    pub fn pixels_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        self.pixels.view_mut()
    }

    pub fn into_pixels(self) -> Array3<u8> {
        self.pixels
    }

    /// Row-major interleaved RGB bytes (`height × width × 3`), the layout
    /// image libraries expect.
    pub fn to_interleaved(&self) -> Vec<u8> {
        self.pixels
            .view()
            .permuted_axes([1, 2, 0])
            .iter()
            .copied()
            .collect()
    }
}
