//! Scanline compositing display driver for Stratum
//!
//! This crate provides:
//! - [`DisplayDriver`], the display task: dirty-region rendering into two
//!   alternating line buffers, touch sampling and gesture dispatch
//! - [`calibrate`], the interactive two-point touch calibration
//! - [`control`], per-task control queues funnelling timer expiries,
//!   callbacks and messages into one receive
//!
//! # Locking
//!
//! Three async mutexes guard the driver, always taken in this order:
//!
//! 1. frame: the panel and both line buffers, held for a whole redraw
//! 2. canvas: scene, dirty regions and screen geometry, held for one line
//!    or one scene mutation at a time
//! 3. touch: the touch controller and the last touch state
//!
//! None of them is recursive. Code that already holds the line lock works
//! on the locked canvas state directly instead of taking the lock again.

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod calibrate;
pub mod control;
pub mod driver;
pub mod touch;

#[cfg(test)]
mod mock;

pub use control::{Callback, ControlEvent, TaskControl, TaskTimer};
pub use driver::{Damage, DisplayDriver, DriverState, DEFAULT_BUF_LEN, UPDATE_TIMEOUT};
pub use touch::NoTouch;
