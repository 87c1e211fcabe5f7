//! Configuration types
//!
//! Display settings and touch calibration, serializable with postcard when
//! the `serde` feature is enabled.

pub mod calibration;
pub mod display;

pub use calibration::*;
pub use display::*;
