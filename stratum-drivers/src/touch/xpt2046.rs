//! XPT2046 resistive touch controller
//!
//! Each conversion is one 3-byte transfer: the control byte, then a 12-bit
//! result left aligned in the following two bytes. Pressure is judged from
//! the Z1 channel alone.

use embedded_hal_async::spi::SpiDevice;
use stratum_core::config::TouchCalibration;
use stratum_core::error::{Error, Result};
use stratum_core::traits::{Rotation, TouchDevice};

/// Control bytes (12-bit, differential reference, power down between
/// conversions)
pub mod cmd {
    pub const READ_X: u8 = 0xD0;
    pub const READ_Y: u8 = 0x90;
    pub const READ_Z1: u8 = 0xB0;
}

/// Z1 level above which the panel counts as pressed
pub const DEFAULT_PRESSURE_THRESHOLD: u16 = 100;

/// Raw reading at the low edge of the active area
pub const RAW_MIN: i32 = 200;
/// Raw reading at the high edge of the active area
pub const RAW_MAX: i32 = 3900;

/// XPT2046 communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Xpt2046Error {
    /// SPI transfer failed
    Spi,
}

impl From<Xpt2046Error> for Error {
    fn from(_: Xpt2046Error) -> Self {
        Error::Bus
    }
}

/// Nominal calibration for a rotation, mapping the raw active area onto a
/// `width` x `height` panel (native, unrotated size)
pub fn default_calibration(rotation: Rotation, width: i32, height: i32) -> TouchCalibration {
    let (w, h) = if rotation.is_transposed() {
        (height, width)
    } else {
        (width, height)
    };
    // Raw readings arrive already swapped for transposed rotations; only
    // the direction of each axis differs.
    let (flip_x, flip_y) = match rotation {
        Rotation::Top => (false, false),
        Rotation::Left => (false, true),
        Rotation::Bottom => (true, true),
        Rotation::Right => (true, false),
    };
    let edge = |flip: bool, size: i32| if flip { (size - 1, 0) } else { (0, size - 1) };
    let (x0, x1) = edge(flip_x, w);
    let (y0, y1) = edge(flip_y, h);
    TouchCalibration::from_two_points((RAW_MIN, RAW_MIN), (x0, y0), (RAW_MAX, RAW_MAX), (x1, y1))
        .unwrap_or_default()
}

/// XPT2046 on an async SPI bus
pub struct Xpt2046<SPI> {
    spi: SPI,
    rotation: Rotation,
    calibration: TouchCalibration,
    threshold: u16,
    native_width: i32,
    native_height: i32,
}

impl<SPI: SpiDevice> Xpt2046<SPI> {
    /// Create a driver for a panel of the given native size
    pub fn new(spi: SPI, native_width: i32, native_height: i32) -> Self {
        Self {
            spi,
            rotation: Rotation::Top,
            calibration: default_calibration(Rotation::Top, native_width, native_height),
            threshold: DEFAULT_PRESSURE_THRESHOLD,
            native_width,
            native_height,
        }
    }

    pub fn set_pressure_threshold(&mut self, threshold: u16) {
        self.threshold = threshold;
    }

    pub fn calibration(&self) -> TouchCalibration {
        self.calibration
    }

    async fn sample(&mut self, command: u8) -> core::result::Result<u16, Xpt2046Error> {
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &[command, 0, 0])
            .await
            .map_err(|_| Xpt2046Error::Spi)?;
        Ok(u16::from_be_bytes([rx[1], rx[2]]) >> 3)
    }

    /// Median of three conversions
    async fn filtered(&mut self, command: u8) -> core::result::Result<i32, Xpt2046Error> {
        let mut samples = [0u16; 3];
        for sample in &mut samples {
            *sample = self.sample(command).await?;
        }
        samples.sort_unstable();
        Ok(samples[1] as i32)
    }

    fn size(&self) -> (i32, i32) {
        if self.rotation.is_transposed() {
            (self.native_height, self.native_width)
        } else {
            (self.native_width, self.native_height)
        }
    }
}

impl<SPI: SpiDevice> TouchDevice for Xpt2046<SPI> {
    async fn init(&mut self) -> Result<()> {
        // A dummy conversion leaves the controller powered down with the
        // pen interrupt enabled
        self.sample(cmd::READ_Z1).await?;
        Ok(())
    }

    async fn get_xy(&mut self) -> Result<Option<(i32, i32)>> {
        let Some(raw) = self.raw_xy().await? else {
            return Ok(None);
        };
        let (x, y) = self.calibration.apply(raw);
        let (w, h) = self.size();
        Ok(Some((x.clamp(0, w - 1), y.clamp(0, h - 1))))
    }

    async fn raw_xy(&mut self) -> Result<Option<(i32, i32)>> {
        if self.sample(cmd::READ_Z1).await? < self.threshold {
            return Ok(None);
        }
        let x = self.filtered(cmd::READ_X).await?;
        let y = self.filtered(cmd::READ_Y).await?;
        // Lifted during the conversions
        if self.sample(cmd::READ_Z1).await? < self.threshold {
            return Ok(None);
        }
        if self.rotation.is_transposed() {
            Ok(Some((y, x)))
        } else {
            Ok(Some((x, y)))
        }
    }

    async fn is_touched(&mut self) -> Result<bool> {
        Ok(self.sample(cmd::READ_Z1).await? >= self.threshold)
    }

    /// Also installs the nominal calibration for the new rotation
    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.calibration = default_calibration(rotation, self.native_width, self.native_height);
    }

    fn set_calibration(&mut self, calibration: TouchCalibration) {
        self.calibration = calibration;
    }
}
