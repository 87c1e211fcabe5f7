//! Rectangles
//!
//! All rectangles use inclusive bounds: `x_end` and `y_end` are the last
//! pixel covered, so a single pixel is `Rect::new(x, y, x, y)`.

use core::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive screen rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x_start: i32,
    pub y_start: i32,
    pub x_end: i32,
    pub y_end: i32,
}

impl Rect {
    /// Create a rectangle from inclusive corners
    pub const fn new(x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
        }
    }

    /// Create a rectangle from an origin and a size
    ///
    /// A zero size yields an invalid rectangle.
    pub const fn from_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    pub const fn width(&self) -> i32 {
        self.x_end - self.x_start + 1
    }

    pub const fn height(&self) -> i32 {
        self.y_end - self.y_start + 1
    }

    /// Start is not past end on either axis
    pub const fn is_valid(&self) -> bool {
        self.x_start <= self.x_end && self.y_start <= self.y_end
    }

    /// Point lies inside (bounds included)
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_start && x <= self.x_end && y >= self.y_start && y <= self.y_end
    }

    /// `other` lies completely inside `self`
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x_start >= self.x_start
            && other.x_end <= self.x_end
            && other.y_start >= self.y_start
            && other.y_end <= self.y_end
    }

    /// Strict interior overlap
    ///
    /// Rectangles that only meet on their edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x_end.min(other.x_end) > self.x_start.max(other.x_start)
            && self.y_end.min(other.y_end) > self.y_start.max(other.y_start)
    }

    /// Share at least one pixel
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_start <= other.x_end
            && other.x_start <= self.x_end
            && self.y_start <= other.y_end
            && other.y_start <= self.y_end
    }

    /// Bounding box of both rectangles
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x_start.min(other.x_start),
            self.y_start.min(other.y_start),
            self.x_end.max(other.x_end),
            self.y_end.max(other.y_end),
        )
    }

    /// Clip to a `width` x `height` screen anchored at the origin
    ///
    /// The result may be invalid if the rectangle is entirely off screen.
    pub fn clamp(&self, width: i32, height: i32) -> Rect {
        Rect::new(
            self.x_start.max(0),
            self.y_start.max(0),
            self.x_end.min(width - 1),
            self.y_end.min(height - 1),
        )
    }

    /// Shift by an offset
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x_start + dx,
            self.y_start + dy,
            self.x_end + dx,
            self.y_end + dy,
        )
    }

    /// Exchange the roles of X and Y
    pub const fn swap_axes(&self) -> Rect {
        Rect::new(self.y_start, self.x_start, self.y_end, self.x_end)
    }

    /// Number of pixels covered
    pub fn area(&self) -> u32 {
        if self.is_valid() {
            self.width() as u32 * self.height() as u32
        } else {
            0
        }
    }

    /// Columns of this rectangle that fall in a line buffer
    ///
    /// The buffer covers `n` pixels starting at coordinate `start`. Returns
    /// the covered coordinates, or `None` when nothing is visible.
    pub fn span_x(&self, start: i32, n: usize) -> Option<RangeInclusive<i32>> {
        span(self.x_start, self.x_end, start, n)
    }

    /// Rows of this rectangle that fall in a column buffer
    pub fn span_y(&self, start: i32, n: usize) -> Option<RangeInclusive<i32>> {
        span(self.y_start, self.y_end, start, n)
    }
}

fn span(from: i32, to: i32, start: i32, n: usize) -> Option<RangeInclusive<i32>> {
    if n == 0 {
        return None;
    }
    let last = start.saturating_add(n as i32 - 1);
    let from = from.max(start);
    let to = to.min(last);
    (from <= to).then_some(from..=to)
}
