//! Display driver settings

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::{Color, PixelFormat};
use crate::traits::Rotation;

/// Direction in which the panel is scanned while streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateMode {
    /// Line by line, top to bottom
    #[default]
    TopBottom,
    /// Column by column, left to right
    ///
    /// The panel is driven one quarter turn ahead of the logical rotation,
    /// which hides tearing on panels that refresh along the other axis.
    LeftRight,
}

/// Display driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    pub update_mode: UpdateMode,
    /// Invert panel colors
    pub inverted: bool,
    /// Color of pixels no object covers
    pub background: Color,
    pub rotation: Rotation,
    /// A touch controller is fitted
    pub touch: bool,
    /// Outline every redrawn rectangle (needs the `debug-borders` feature
    /// in the display crate)
    pub debug_borders: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            update_mode: UpdateMode::TopBottom,
            inverted: false,
            background: Color::BLACK,
            rotation: Rotation::Top,
            touch: true,
            debug_borders: false,
        }
    }
}
