//! Hardware abstraction traits
//!
//! These traits define the interface between the compositing logic and the
//! panel/touch controller drivers.

pub mod display;
pub mod touch;

pub use display::{DisplayDevice, Rotation};
pub use touch::TouchDevice;
