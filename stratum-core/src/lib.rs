//! Board-agnostic compositing core for the Stratum display stack
//!
//! This crate contains everything that does not depend on a specific
//! display controller or async runtime:
//!
//! - Flat result codes shared by the whole stack
//! - Compile-time selected pixel formats and the named color table
//! - Inclusive rectangles and the dirty-region processor
//! - The visual object scene (z-ordered, nestable object lists)
//! - Representative widgets (fills, labels, pictures, tiled maps)
//! - Hardware traits for displays and touch controllers
//! - Display configuration and touch calibration data

#![no_std]
#![deny(unsafe_code)]

pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod image;
pub mod region;
pub mod scene;
pub mod traits;
pub mod widgets;

pub use color::{Color, PixelFormat};
pub use error::{Error, Result};
pub use geometry::Rect;
pub use region::DirtyRegions;
pub use scene::{ActionEvent, ActionKind, DamageSink, Scene, VisHandle, Widget};
