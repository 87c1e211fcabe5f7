//! Display panel trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;

/// Panel orientation, named after where the connector edge ends up
///
/// Rotating steps clockwise: Top, Left, Bottom, Right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Top,
    Left,
    Bottom,
    Right,
}

impl Rotation {
    /// Quarter turn forward
    pub const fn next(self) -> Self {
        match self {
            Rotation::Top => Rotation::Left,
            Rotation::Left => Rotation::Bottom,
            Rotation::Bottom => Rotation::Right,
            Rotation::Right => Rotation::Top,
        }
    }

    /// Quarter turn back
    pub const fn prev(self) -> Self {
        match self {
            Rotation::Top => Rotation::Right,
            Rotation::Left => Rotation::Top,
            Rotation::Bottom => Rotation::Left,
            Rotation::Right => Rotation::Bottom,
        }
    }

    /// Width and height trade places relative to `Top`
    pub const fn is_transposed(self) -> bool {
        matches!(self, Rotation::Left | Rotation::Right)
    }
}

/// Trait for scanline-streamed display panels
///
/// The panel has no framebuffer on the MCU side. The render loop opens an
/// address window, then streams it one line buffer at a time.
#[allow(async_fn_in_trait)]
pub trait DisplayDevice {
    /// Reset and configure the panel
    async fn init(&mut self) -> Result<()>;

    /// Open an inclusive address window in panel coordinates
    async fn set_addr_window(&mut self, x_start: i32, y_start: i32, x_end: i32, y_end: i32)
        -> Result<()>;

    /// Stream pixels into the open window
    ///
    /// The future completes once the transfer has completed and `data` may be
    /// reused.
    async fn write_stream(&mut self, data: &[Color]) -> Result<()>;

    /// Close the current window transfer
    async fn stop_transfer(&mut self) -> Result<()>;

    /// Apply a rotation; `width`/`height` report the rotated size after this
    async fn set_rotation(&mut self, rotation: Rotation) -> Result<()>;

    async fn invert_display(&mut self, invert: bool) -> Result<()>;

    /// No transfer is in flight
    fn is_transfer_complete(&self) -> bool {
        true
    }

    /// Line buffers must pass through [`DisplayDevice::prepare_data`]
    /// before being streamed
    fn is_data_need_preparation(&self) -> bool {
        false
    }

    /// Convert a rendered line into the panel's wire order in place
    fn prepare_data(&self, data: &mut [Color]) {
        let _ = data;
    }

    /// Pixels streamed since the window was opened
    fn pixel_data_count(&self) -> usize;

    /// Width in the current rotation
    fn width(&self) -> i32;

    /// Height in the current rotation
    fn height(&self) -> i32;
}
