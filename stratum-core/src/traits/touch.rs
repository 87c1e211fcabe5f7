//! Touch controller trait

use super::display::Rotation;
use crate::config::TouchCalibration;
use crate::error::Result;

/// Trait for touch panel controllers
#[allow(async_fn_in_trait)]
pub trait TouchDevice {
    /// Configure the controller
    async fn init(&mut self) -> Result<()>;

    /// Calibrated screen position, `None` while not pressed
    async fn get_xy(&mut self) -> Result<Option<(i32, i32)>>;

    /// Uncalibrated controller reading, `None` while not pressed
    ///
    /// Used by the calibration procedure.
    async fn raw_xy(&mut self) -> Result<Option<(i32, i32)>>;

    /// Panel is pressed
    async fn is_touched(&mut self) -> Result<bool> {
        Ok(self.raw_xy().await?.is_some())
    }

    /// Follow the display rotation
    fn set_rotation(&mut self, rotation: Rotation);

    /// Install calibration coefficients
    fn set_calibration(&mut self, calibration: TouchCalibration);
}
