//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in stratum-core:
//!
//! - ILI9341-class SPI TFT panels ([`display::Ili9341`])
//! - XPT2046-class resistive touch controllers ([`touch::Xpt2046`])

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod touch;

#[cfg(test)]
mod mock;
