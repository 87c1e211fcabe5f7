//! Image widget

use crate::color::Color;
use crate::geometry::Rect;
use crate::image::Image;
use crate::scene::Widget;

/// Draws an [`Image`] at its natural size
#[derive(Debug, Clone, Copy)]
pub struct Picture {
    pub image: &'static Image,
}

impl Picture {
    pub const fn new(image: &'static Image) -> Self {
        Self { image }
    }
}

impl Widget for Picture {
    fn size(&self) -> (i32, i32) {
        (self.image.width, self.image.height)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        let Some(span) = area.span_x(start_x, buf.len()) else {
            return;
        };
        let y = line - area.y_start;
        for x in span {
            if let Some(color) = self.image.pixel(x - area.x_start, y) {
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
            if let Some(color) = self.image.pixel(x, y - area.y_start) {
                buf[(y - start_y) as usize] = color;
            }
        }
    }
}
