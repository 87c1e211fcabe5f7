//! Visual objects and z-ordered object lists
//!
//! A [`Scene`] is an arena of visual objects addressed by [`VisHandle`].
//! Objects are created detached, attached to a list with
//! [`Scene::show`] and detached again with [`Scene::hide`]. Lists are
//! objects themselves, so a list can be shown inside another list to group
//! objects into sub-screens. Slot 0 is the root list that covers the screen.
//!
//! Link fields (`prev`, `next`, owning list) are private to this module;
//! only list insertion and removal touch them.
//!
//! # Coordinates
//!
//! An object's area is relative to the origin of the list it belongs to.
//! Drawing and touch dispatch translate by each list's origin on the way
//! down, so widgets only ever see coordinates in their own list's frame.

mod list;

pub use list::{Scene, ROOT};

use crate::color::Color;
use crate::geometry::Rect;

/// Handle to an object in a [`Scene`]
///
/// Handles carry a generation, so a handle to a removed object stays
/// invalid even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VisHandle {
    index: u16,
    generation: u16,
}

impl VisHandle {
    pub(crate) const fn new(index: u16, generation: u16) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    pub const fn index(&self) -> u16 {
        self.index
    }
}

/// Gesture delivered to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionKind {
    /// Finger went down on the object
    Touch,
    /// Finger lifted from the object
    Untouch,
    /// Finger moved while staying on the object
    Move,
    /// Finger stayed still on the object
    Hold,
    /// Finger slid onto the object
    MoveIn,
    /// Finger slid off the object
    MoveOut,
}

/// Gesture with its coordinates
///
/// Coordinates are in the frame of the list that owns the receiving object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionEvent {
    pub kind: ActionKind,
    /// Current touch point
    pub x: i32,
    pub y: i32,
    /// Previous touch point
    pub prev_x: i32,
    pub prev_y: i32,
}

/// Something that can be drawn one line at a time
///
/// Implementations must only write pixels that fall inside both the buffer
/// and their own `area`. The buffer length is its capacity.
pub trait Widget {
    /// Natural size (width, height) of the widget
    fn size(&self) -> (i32, i32);

    /// Draw the part of `line` covered by this widget into a row buffer
    ///
    /// `buf[0]` is the pixel at column `start_x`.
    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32);

    /// Draw the part of column `row` covered by this widget into a column buffer
    ///
    /// `buf[0]` is the pixel at line `start_y`.
    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32);

    /// Gesture hook
    ///
    /// Returns true when the widget changed and its area must be redrawn.
    fn action(&mut self, area: &Rect, event: &ActionEvent) -> bool {
        let _ = (area, event);
        false
    }
}

/// Receiver for areas that must be redrawn
///
/// Areas are absolute screen coordinates.
pub trait DamageSink {
    fn invalidate(&mut self, area: Rect);
}

impl<const N: usize> DamageSink for heapless::Vec<Rect, N> {
    fn invalidate(&mut self, area: Rect) {
        let _ = self.push(area);
    }
}
