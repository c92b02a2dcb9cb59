//! Packed-integer render target.
//!
//! One `u32` per pixel, channels packed `blue << 16 | green << 8 | red`,
//! row-major from the top-left corner.

use lumen_math::Vec3A;

use crate::renderer::RenderError;

/// Pack a linear color, clamping each channel of `c * 256` to `[0, 255]`.
#[inline]
pub fn pack_color(color: Vec3A) -> u32 {
    let channel = |c: f32| (c * 256.0).clamp(0.0, 255.0) as u32;
    (channel(color.z) << 16) | (channel(color.y) << 8) | channel(color.x)
}

/// Inverse of [`pack_color`] up to quantisation: channels come back in
/// `[0, 1]`.
#[inline]
pub fn unpack_color(packed: u32) -> Vec3A {
    let red = (packed & 0xFF) as f32;
    let green = ((packed >> 8) & 0xFF) as f32;
    let blue = ((packed >> 16) & 0xFF) as f32;
    Vec3A::new(red, green, blue) / 255.0
}

/// Output pixels plus dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Create a black buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        Self::from_raw(width, height, vec![0; width as usize * height as usize])
    }

    /// Wrap existing pixel storage, checking it matches the dimensions.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, RenderError> {
        check_dimensions(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Packed pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[pixel_index(self.width, x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, packed: u32) {
        let index = pixel_index(self.width, x, y);
        self.pixels[index] = packed;
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &packed in &self.pixels {
            let [r, g, b, _] = packed.to_le_bytes();
            bytes.extend_from_slice(&[r, g, b, 255]);
        }
        bytes
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

/// Row-major slot of (x, y), computed in `usize` so large targets do not
/// wrap.
#[inline]
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Validate a `width` x `height` target backed by `len` pixels.
pub(crate) fn check_dimensions(width: u32, height: u32, len: usize) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyTarget { width, height });
    }
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: len,
        });
    }
    Ok(())
}
