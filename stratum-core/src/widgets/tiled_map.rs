//! Grid of tiles cut from a tileset image

use heapless::Vec;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::image::Image;
use crate::scene::Widget;

/// Maximum number of cells in a map
pub const MAX_TILES: usize = 256;

/// Tile map
///
/// The tileset is cut into `tile_width` x `tile_height` tiles numbered left
/// to right, top to bottom. Each map cell holds a tile number.
#[derive(Debug, Clone)]
pub struct TiledMap {
    tileset: &'static Image,
    tile_width: i32,
    tile_height: i32,
    cols: i32,
    rows: i32,
    tiles: Vec<u8, MAX_TILES>,
}

impl TiledMap {
    /// Create a `cols` x `rows` map filled with tile 0
    pub fn new(
        tileset: &'static Image,
        tile_width: i32,
        tile_height: i32,
        cols: i32,
        rows: i32,
    ) -> Result<Self> {
        if tile_width <= 0 || tile_height <= 0 || cols <= 0 || rows <= 0 {
            return Err(Error::BadParameter);
        }
        if tileset.width < tile_width || tileset.height < tile_height {
            return Err(Error::BadParameter);
        }
        let cells = (cols * rows) as usize;
        if cells > MAX_TILES {
            return Err(Error::Overflow);
        }
        let mut tiles = Vec::new();
        tiles.resize(cells, 0).map_err(|_| Error::Overflow)?;
        Ok(Self {
            tileset,
            tile_width,
            tile_height,
            cols,
            rows,
            tiles,
        })
    }

    /// Set every cell from a row-major slice
    pub fn set_tiles(&mut self, tiles: &[u8]) -> Result<()> {
        if tiles.len() != self.tiles.len() {
            return Err(Error::BadParameter);
        }
        self.tiles.copy_from_slice(tiles);
        Ok(())
    }

    pub fn set_tile(&mut self, col: i32, row: i32, tile: u8) -> Result<()> {
        let index = self.cell(col, row).ok_or(Error::BadParameter)?;
        self.tiles[index] = tile;
        Ok(())
    }

    pub fn tile(&self, col: i32, row: i32) -> Option<u8> {
        self.cell(col, row).map(|index| self.tiles[index])
    }

    fn cell(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols || row >= self.rows {
            return None;
        }
        Some((row * self.cols + col) as usize)
    }

    /// Color at a map-relative position
    fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let tile = self.tile(x / self.tile_width, y / self.tile_height)? as i32;
        let per_row = self.tileset.width / self.tile_width;
        let sx = (tile % per_row) * self.tile_width + x % self.tile_width;
        let sy = (tile / per_row) * self.tile_height + y % self.tile_height;
        self.tileset.pixel(sx, sy)
    }
}

impl Widget for TiledMap {
    fn size(&self) -> (i32, i32) {
        (self.cols * self.tile_width, self.rows * self.tile_height)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        let Some(span) = area.span_x(start_x, buf.len()) else {
            return;
        };
        let y = line - area.y_start;
        for x in span {
            if let Some(color) = self.pixel(x - area.x_start, y) {
                buf[(x - start_x) as usize] = color;
            }
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        let Some(span) = area.span_y(start_y, buf.len()) else {
            return;
        };
        let x = row - area.x_start;
        for y in span {
            if let Some(color) = self.pixel(x, y - area.y_start) {
                buf[(y - start_y) as usize] = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PixelFormat;
    use crate::image::ImageData;

    // Two 2x2 tiles side by side: solid red, solid green
    static SHEET: [Color; 8] = [
        Color::RED,
        Color::RED,
        Color::GREEN,
        Color::GREEN,
        Color::RED,
        Color::RED,
        Color::GREEN,
        Color::GREEN,
    ];
    static TILESET: Image = Image {
        width: 4,
        height: 2,
        bits_per_pixel: 0,
        data: ImageData::Direct(&SHEET),
        palette: None,
        transparent: -1,
    };

    #[test]
    fn test_rejects_bad_geometry() {
        assert_eq!(TiledMap::new(&TILESET, 0, 2, 2, 2).err(), Some(Error::BadParameter));
        assert_eq!(TiledMap::new(&TILESET, 8, 2, 2, 2).err(), Some(Error::BadParameter));
        assert_eq!(TiledMap::new(&TILESET, 2, 2, 20, 20).err(), Some(Error::Overflow));
    }

    #[test]
    fn test_tiles_select_sheet_cells() {
        let mut map = TiledMap::new(&TILESET, 2, 2, 3, 1).unwrap();
        map.set_tiles(&[0, 1, 0]).unwrap();
        assert_eq!(map.size(), (6, 2));

        let area = Rect::from_size(0, 0, 6, 2);
        let mut buf = [Color::BLACK; 6];
        map.draw_in_buf_w(&area, &mut buf, 1, 0);
        assert_eq!(
            buf,
            [Color::RED, Color::RED, Color::GREEN, Color::GREEN, Color::RED, Color::RED]
        );
    }

    #[test]
    fn test_set_tile_bounds() {
        let mut map = TiledMap::new(&TILESET, 2, 2, 2, 2).unwrap();
        map.set_tile(1, 1, 1).unwrap();
        assert_eq!(map.tile(1, 1), Some(1));
        assert_eq!(map.set_tile(2, 0, 1), Err(Error::BadParameter));
        assert_eq!(map.tile(-1, 0), None);
    }
}
