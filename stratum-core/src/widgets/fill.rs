//! Solid rectangle

use crate::color::Color;
use crate::geometry::Rect;
use crate::scene::Widget;

/// Solid block of one color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fill {
    pub width: i32,
    pub height: i32,
    pub color: Color,
}

impl Fill {
    pub const fn new(width: i32, height: i32, color: Color) -> Self {
        Self {
            width,
            height,
            color,
        }
    }
}

impl Widget for Fill {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        if line < area.y_start || line > area.y_end {
            return;
        }
        if let Some(span) = area.span_x(start_x, buf.len()) {
            let from = (span.start() - start_x) as usize;
            let to = (span.end() - start_x) as usize;
            buf[from..=to].fill(self.color);
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        if row < area.x_start || row > area.x_end {
            return;
        }
        if let Some(span) = area.span_y(start_y, buf.len()) {
            let from = (span.start() - start_y) as usize;
            let to = (span.end() - start_y) as usize;
            buf[from..=to].fill(self.color);
        }
    }
}
