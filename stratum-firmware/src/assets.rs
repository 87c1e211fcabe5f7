//! Bitmaps of the demo screen

use stratum_core::image::{Image, ImageData};
use stratum_core::{Color, PixelFormat};

static LOGO_PALETTE: [Color; 2] = [Color::BLACK, Color::ORANGE];

#[rustfmt::skip]
static LOGO_BITS: [u8; 32] = [
    0b00000111, 0b11100000,
    0b00011111, 0b11111000,
    0b00111000, 0b00011100,
    0b01110000, 0b00001110,
    0b01100111, 0b11100110,
    0b11001111, 0b11110011,
    0b11001100, 0b00000011,
    0b11001111, 0b11100011,
    0b11000111, 0b11110011,
    0b11000000, 0b00110011,
    0b11001111, 0b11110011,
    0b01100111, 0b11100110,
    0b01110000, 0b00001110,
    0b00111000, 0b00011100,
    0b00011111, 0b11111000,
    0b00000111, 0b11100000,
];

/// 16x16 badge, index 0 transparent
pub static LOGO: Image = Image {
    width: 16,
    height: 16,
    bits_per_pixel: 1,
    data: ImageData::Indexed(&LOGO_BITS),
    palette: Some(&LOGO_PALETTE),
    transparent: 0,
};

pub const TILE_SIZE: i32 = 8;

static TILE_PALETTE: [Color; 4] = [Color::DARKGREY, Color::DARKGREEN, Color::GREEN, Color::OLIVE];

/// Four 8x8 tiles side by side: ground, grass, bush, brick
#[rustfmt::skip]
static TILE_BITS: [u8; 64] = [
    0x00, 0x00, 0x55, 0x55, 0x55, 0x55, 0xFF, 0xFF,
    0x00, 0x00, 0x95, 0x56, 0x5A, 0xA5, 0xFF, 0xFF,
    0x00, 0x00, 0x55, 0x55, 0x6A, 0xA9, 0xC0, 0xC0,
    0x00, 0x00, 0x55, 0x55, 0xAA, 0xAA, 0xFF, 0xFF,
    0x00, 0x00, 0x55, 0x55, 0xAA, 0xAA, 0xFF, 0xFF,
    0x00, 0x00, 0x55, 0x55, 0x6A, 0xA9, 0xFF, 0xFF,
    0x00, 0x00, 0x55, 0x55, 0x5A, 0xA5, 0x0C, 0x0C,
    0x00, 0x00, 0x55, 0x55, 0x55, 0x55, 0xFF, 0xFF,
];

/// 32x8 tileset, 2 bits per pixel
pub static TILESET: Image = Image {
    width: 32,
    height: 8,
    bits_per_pixel: 2,
    data: ImageData::Indexed(&TILE_BITS),
    palette: Some(&TILE_PALETTE),
    transparent: -1,
};

/// Number of tiles in [`TILESET`]
pub const TILE_COUNT: u8 = 4;
