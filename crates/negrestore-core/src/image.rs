//! Image representation for the restoration pipeline.

use std::fmt;

/// One of the three color channels of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red, index 0.
    Red,
    /// Green, index 1.
    Green,
    /// Blue, index 2.
    Blue,
}

impl Channel {
    /// All channels in canonical buffer order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position of this channel inside a pixel.
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// Internal image representation. Always interleaved 8-bit R, G, B.
///
/// Every stage of the pipeline takes a buffer by reference and returns a
/// new one with the same dimensions; buffers are never edited in place
/// across stage boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl PixelBuffer {
    /// Build a buffer from row-major pixels.
    ///
    /// # Panics
    /// If `pixels.len() != width × height`.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(width, height, vec![rgb; width as usize * height as usize])
    }

    /// Build a buffer from packed `RGBRGB…` bytes.
    ///
    /// # Panics
    /// If `bytes.len() != width × height × 3`.
    pub fn from_raw(width: u32, height: u32, bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            width as usize * height as usize * 3,
            "byte count does not match {width}x{height} RGB"
        );
        Self::new(width, height, bytemuck::cast_slice(bytes).to_vec())
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// True for a zero-area image.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    /// Packed `RGBRGB…` view of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterate over one channel's samples in row-major order.
    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = u8> + '_ {
        let idx = channel.index();
        self.pixels.iter().map(move |px| px[idx])
    }

    /// Produce a new buffer of the same size by mapping every pixel.
    pub fn map_pixels(&self, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|&px| f(px)).collect(),
        }
    }

    /// Produce a new buffer by remapping each channel through its own table.
    pub fn map_channels(&self, luts: &[[u8; 256]; 3]) -> Self {
        self.map_pixels(|px| {
            [
                luts[0][px[0] as usize],
                luts[1][px[1] as usize],
                luts[2][px[2] as usize],
            ]
        })
    }

    /// Smallest and largest sample across every channel, `None` when empty.
    pub fn sample_range(&self) -> Option<(u8, u8)> {
        self.as_bytes().iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// True when every pixel has the same color.
    pub fn is_solid(&self) -> bool {
        match self.pixels.first() {
            Some(first) => self.pixels.iter().all(|px| px == first),
            None => true,
        }
    }
}
