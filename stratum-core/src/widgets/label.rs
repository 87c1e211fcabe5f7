//! Single line of text

use heapless::String;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::font::Font;
use crate::geometry::Rect;
use crate::scene::Widget;

/// Maximum label length in bytes
pub const LABEL_CAPACITY: usize = 64;

/// Text drawn in a bitmap font
///
/// Without a background color the gaps between glyph pixels are left
/// untouched, so whatever lies underneath shows through.
#[derive(Debug, Clone)]
pub struct Label {
    text: String<LABEL_CAPACITY>,
    font: &'static Font,
    pub color: Color,
    pub background: Option<Color>,
}

impl Label {
    /// Create a label; text beyond the capacity is cut off
    pub fn new(text: &str, font: &'static Font, color: Color) -> Self {
        let mut label = Self {
            text: String::new(),
            font,
            color,
            background: None,
        };
        let _ = label.set_text(text);
        label
    }

    /// Draw on an opaque background
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text
    ///
    /// Keeps the longest prefix that fits and reports `Overflow` if anything
    /// was cut.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.text.clear();
        for ch in text.chars() {
            if self.text.push(ch).is_err() {
                return Err(Error::Overflow);
            }
        }
        Ok(())
    }

    pub fn font(&self) -> &'static Font {
        self.font
    }

    /// Color of the text pixel at a label-relative position
    fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let advance = self.font.advance();
        if x < 0 || advance <= 0 {
            return self.background;
        }
        let ch = self.text.chars().nth((x / advance) as usize)?;
        if self.font.pixel(ch, x % advance, y) {
            Some(self.color)
        } else {
            self.background
        }
    }
}

impl Widget for Label {
    fn size(&self) -> (i32, i32) {
        (self.font.text_width(&self.text), self.font.height as i32)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        let Some(span) = area.span_x(start_x, buf.len()) else {
            return;
        };
        let y = line - area.y_start;
        let advance = self.font.advance();
        if advance <= 0 {
            return;
        }
        let mut chars = self.text.chars();
        let mut cell = -1;
        let mut ch = ' ';

        for x in span {
            let rel = x - area.x_start;
            // Columns increase monotonically, so walk the text once
            while cell < rel / advance {
                ch = chars.next().unwrap_or(' ');
                cell += 1;
            }
            let color = if self.font.pixel(ch, rel % advance, y) {
                Some(self.color)
            } else {
                self.background
            };
            if let Some(color) = color {
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
