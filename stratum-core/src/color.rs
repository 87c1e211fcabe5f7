//! Pixel formats
//!
//! The pixel format is selected at compile time. Every format exposes the
//! same table of named colors at its own bit pattern, so widgets and
//! applications are written once against [`Color`].
//!
//! | Feature         | Type       | Layout                          |
//! |-----------------|------------|---------------------------------|
//! | (default)       | [`Bgr888`] | `0x00BBGGRR`                    |
//! | `color-rgb565`  | [`Rgb565`] | `RRRRRGGG_GGGBBBBB`             |
//! | `color-rgb111`  | [`Rgb111`] | `0b0000_0RGB`, two pixels/byte  |

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Color type used by the whole stack
#[cfg(feature = "color-rgb111")]
pub type Color = Rgb111;

/// Color type used by the whole stack
#[cfg(all(feature = "color-rgb565", not(feature = "color-rgb111")))]
pub type Color = Rgb565;

/// Color type used by the whole stack
#[cfg(not(any(feature = "color-rgb565", feature = "color-rgb111")))]
pub type Color = Bgr888;

/// A packed pixel format with the named color table
pub trait PixelFormat: Copy + PartialEq + Default + 'static {
    /// Significant bits per pixel
    const BITS: u8;
    /// Two pixels share one storage unit, so updates must start on an even
    /// coordinate and end on an odd one
    const EVEN_COORDINATES: bool;

    const BLACK: Self;
    const NAVY: Self;
    const DARKGREEN: Self;
    const DARKCYAN: Self;
    const MAROON: Self;
    const PURPLE: Self;
    const OLIVE: Self;
    const LIGHTGREY: Self;
    const DARKGREY: Self;
    const BLUE: Self;
    const GREEN: Self;
    const CYAN: Self;
    const RED: Self;
    const MAGENTA: Self;
    const YELLOW: Self;
    const WHITE: Self;
    const ORANGE: Self;
    const GREENYELLOW: Self;
    const PINK: Self;

    /// Pack 8-bit channels
    fn from_rgb(r: u8, g: u8, b: u8) -> Self;

    /// Unpack to 8-bit channels
    fn to_rgb(self) -> (u8, u8, u8);

    /// Raw bit pattern (used for transparent color keys)
    fn into_raw(self) -> u32;
}

macro_rules! named_colors {
    () => {
        const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
        const NAVY: Self = Self::rgb(0x00, 0x00, 0x80);
        const DARKGREEN: Self = Self::rgb(0x00, 0x80, 0x00);
        const DARKCYAN: Self = Self::rgb(0x00, 0x80, 0x80);
        const MAROON: Self = Self::rgb(0x80, 0x00, 0x00);
        const PURPLE: Self = Self::rgb(0x80, 0x00, 0x80);
        const OLIVE: Self = Self::rgb(0x80, 0x80, 0x00);
        const LIGHTGREY: Self = Self::rgb(0xC0, 0xC0, 0xC0);
        const DARKGREY: Self = Self::rgb(0x40, 0x40, 0x40);
        const BLUE: Self = Self::rgb(0x00, 0x00, 0xFF);
        const GREEN: Self = Self::rgb(0x00, 0xFF, 0x00);
        const CYAN: Self = Self::rgb(0x00, 0xFF, 0xFF);
        const RED: Self = Self::rgb(0xFF, 0x00, 0x00);
        const MAGENTA: Self = Self::rgb(0xFF, 0x00, 0xFF);
        const YELLOW: Self = Self::rgb(0xFF, 0xFF, 0x00);
        const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
        const ORANGE: Self = Self::rgb(0xFF, 0xA5, 0x00);
        const GREENYELLOW: Self = Self::rgb(0xAD, 0xFF, 0x2F);
        const PINK: Self = Self::rgb(0xFF, 0xC0, 0xCB);
    };
}

/// 24-bit color stored as `0x00BBGGRR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Bgr888(pub u32);

impl Bgr888 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((b as u32) << 16) | ((g as u32) << 8) | r as u32)
    }
}

impl PixelFormat for Bgr888 {
    const BITS: u8 = 24;
    const EVEN_COORDINATES: bool = false;

    named_colors!();

    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r, g, b)
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        (self.0 as u8, (self.0 >> 8) as u8, (self.0 >> 16) as u8)
    }

    fn into_raw(self) -> u32 {
        self.0
    }
}

/// 16-bit 5-6-5 color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self((((r as u16) >> 3) << 11) | (((g as u16) >> 2) << 5) | ((b as u16) >> 3))
    }
}

impl PixelFormat for Rgb565 {
    const BITS: u8 = 16;
    const EVEN_COORDINATES: bool = false;

    named_colors!();

    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r, g, b)
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        // Replicate the high bits so full scale maps to 0xFF
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }

    fn into_raw(self) -> u32 {
        self.0 as u32
    }
}

/// 3-bit color, one bit per channel (`0b0000_0RGB`)
///
/// Panels using this format store two pixels per byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Rgb111(pub u8);

impl Rgb111 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r >> 7) << 2) | ((g >> 7) << 1) | (b >> 7))
    }

    /// Pack two pixels into the byte layout panels expect (first pixel high)
    pub const fn pack_pair(first: Self, second: Self) -> u8 {
        (first.0 << 4) | second.0
    }
}

impl PixelFormat for Rgb111 {
    const BITS: u8 = 3;
    const EVEN_COORDINATES: bool = true;

    named_colors!();

    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r, g, b)
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        let channel = |bit: u8| if self.0 & bit != 0 { 0xFF } else { 0x00 };
        (channel(0b100), channel(0b010), channel(0b001))
    }

    fn into_raw(self) -> u32 {
        self.0 as u32
    }
}

/// Perceived brightness (0-255) of a color, used to compare formats
pub fn luma<C: PixelFormat>(color: C) -> u8 {
    let (r, g, b) = color.to_rgb();
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table<C: PixelFormat>() -> [C; 19] {
        [
            C::BLACK,
            C::NAVY,
            C::DARKGREEN,
            C::DARKCYAN,
            C::MAROON,
            C::PURPLE,
            C::OLIVE,
            C::LIGHTGREY,
            C::DARKGREY,
            C::BLUE,
            C::GREEN,
            C::CYAN,
            C::RED,
            C::MAGENTA,
            C::YELLOW,
            C::WHITE,
            C::ORANGE,
            C::GREENYELLOW,
            C::PINK,
        ]
    }

    fn assert_black_darkest_white_lightest<C: PixelFormat>() {
        let colors = table::<C>();
        for color in colors {
            assert!(luma(C::BLACK) <= luma(color));
            assert!(luma(C::WHITE) >= luma(color));
        }
        assert_eq!(C::BLACK.to_rgb(), (0, 0, 0));
        assert_eq!(C::WHITE.to_rgb(), (0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn test_bgr888_layout() {
        assert_eq!(Bgr888::RED.0, 0x0000_00FF);
        assert_eq!(Bgr888::GREEN.0, 0x0000_FF00);
        assert_eq!(Bgr888::BLUE.0, 0x00FF_0000);
        assert_eq!(Bgr888::WHITE.0, 0x00FF_FFFF);
    }

    #[test]
    fn test_bgr888_exact_roundtrip() {
        for color in table::<Bgr888>() {
            let (r, g, b) = color.to_rgb();
            assert_eq!(Bgr888::from_rgb(r, g, b), color);
        }
        assert_black_darkest_white_lightest::<Bgr888>();
    }

    #[test]
    fn test_rgb565_roundtrip_is_stable() {
        for color in table::<Rgb565>() {
            let (r, g, b) = color.to_rgb();
            // Unpacked channels must pack back to the same bits
            assert_eq!(Rgb565::from_rgb(r, g, b), color);
        }
        assert_eq!(Rgb565::RED.0, 0xF800);
        assert_eq!(Rgb565::GREEN.0, 0x07E0);
        assert_eq!(Rgb565::BLUE.0, 0x001F);
        assert_black_darkest_white_lightest::<Rgb565>();
    }

    #[test]
    fn test_rgb111_keeps_color_family() {
        assert_eq!(Rgb111::RED.to_rgb(), (0xFF, 0, 0));
        assert_eq!(Rgb111::GREEN.to_rgb(), (0, 0xFF, 0));
        assert_eq!(Rgb111::BLUE.to_rgb(), (0, 0, 0xFF));
        assert_eq!(Rgb111::YELLOW.to_rgb(), (0xFF, 0xFF, 0));
        // Dark shades collapse towards black, light ones towards white
        assert_eq!(Rgb111::DARKGREY, Rgb111::BLACK);
        assert_eq!(Rgb111::LIGHTGREY, Rgb111::WHITE);
        assert_black_darkest_white_lightest::<Rgb111>();
    }

    #[test]
    fn test_rgb111_pair_packing() {
        assert_eq!(Rgb111::pack_pair(Rgb111::WHITE, Rgb111::BLACK), 0x70);
        assert_eq!(Rgb111::pack_pair(Rgb111::BLUE, Rgb111::RED), 0x14);
    }
}
