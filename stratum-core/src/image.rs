//! Static image assets

use crate::color::{Color, PixelFormat};

/// Pixel storage of an [`Image`]
#[derive(Debug, Clone, Copy)]
pub enum ImageData {
    /// Packed palette indices, most significant bits first, rows padded to
    /// a whole byte
    Indexed(&'static [u8]),
    /// One color per pixel, row-major
    Direct(&'static [Color]),
}

/// Bitmap image
#[derive(Debug, Clone, Copy)]
pub struct Image {
    pub width: i32,
    pub height: i32,
    /// 1, 2, 4 or 8 for indexed data; ignored for direct data
    pub bits_per_pixel: u8,
    pub data: ImageData,
    /// Index to color table; a grey ramp is used when absent
    pub palette: Option<&'static [Color]>,
    /// Raw value (palette index, or color bits for direct data) that is not
    /// drawn; -1 draws every pixel
    pub transparent: i32,
}

impl Image {
    /// Color of a pixel, `None` when transparent or out of range
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        match self.data {
            ImageData::Direct(colors) => {
                let color = *colors.get((y * self.width + x) as usize)?;
                if self.transparent >= 0 && color.into_raw() == self.transparent as u32 {
                    None
                } else {
                    Some(color)
                }
            }
            ImageData::Indexed(bytes) => {
                let index = self.index_at(bytes, x, y)?;
                if self.transparent >= 0 && index as i32 == self.transparent {
                    return None;
                }
                Some(self.lookup(index))
            }
        }
    }

    fn index_at(&self, bytes: &[u8], x: i32, y: i32) -> Option<u8> {
        let bpp = match self.bits_per_pixel {
            bpp @ (1 | 2 | 4 | 8) => bpp as usize,
            _ => return None,
        };
        let stride = (self.width as usize * bpp).div_ceil(8);
        let bit = x as usize * bpp;
        let byte = *bytes.get(y as usize * stride + bit / 8)?;
        let shift = 8 - bpp - bit % 8;
        let mask = ((1u16 << bpp) - 1) as u8;
        Some((byte >> shift) & mask)
    }

    fn lookup(&self, index: u8) -> Color {
        match self.palette {
            Some(palette) => palette.get(index as usize).copied().unwrap_or(Color::BLACK),
            None => {
                let max = (1u16 << self.bits_per_pixel.min(8)) - 1;
                let level = (index as u16 * 255 / max.max(1)) as u8;
                Color::from_rgb(level, level, level)
            }
        }
    }
}
