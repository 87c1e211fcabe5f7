//! Interactive two-point touch calibration
//!
//! A crosshair is shown near the top-left corner, then near the bottom-right
//! one. For each, the raw readings of one press are averaged; the two
//! averages against the known target positions give the linear mapping
//! handed to the touch controller. Gesture dispatch is suspended meanwhile.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use stratum_core::config::TouchCalibration;
use stratum_core::traits::{DisplayDevice, TouchDevice};
use stratum_core::widgets::Fill;
use stratum_core::{Color, PixelFormat, Result, VisHandle, Widget};

use crate::driver::DisplayDriver;

/// Interval between raw samples
pub const SAMPLE_PERIOD_MS: u32 = 10;

/// Shorter presses are ignored
pub const MIN_SAMPLES: i64 = 8;

/// Crosshair arm length; the cross is `2 * CROSS_ARM + 1` pixels wide
const CROSS_ARM: i32 = 7;

impl<M, D, T, W, const OBJS: usize, const REGIONS: usize, const BUF_LEN: usize>
    DisplayDriver<M, D, T, W, OBJS, REGIONS, BUF_LEN>
where
    M: RawMutex,
    D: DisplayDevice,
    T: TouchDevice,
    W: Widget + From<Fill>,
{
    /// Calibrate the touch panel against two on-screen targets
    ///
    /// Waits for the user indefinitely. The resulting coefficients are
    /// installed in the touch controller and returned so the board can
    /// persist them.
    pub async fn touch_calibrate<DL: DelayNs>(&self, delay: &mut DL) -> Result<TouchCalibration> {
        let (width, height) = (self.width(), self.height());
        let targets = [
            (width / 10, height / 10),
            (width * 9 / 10, height * 9 / 10),
        ];

        self.set_calibrating(true);
        let result = self.measure(targets, delay).await;
        self.set_calibrating(false);

        let calibration = result?;
        self.install_calibration(calibration).await?;
        info!(
            "touch calibrated: kx={} ky={} bx={} by={}",
            calibration.kx,
            calibration.ky,
            calibration.bx,
            calibration.by
        );
        Ok(calibration)
    }

    async fn measure<DL: DelayNs>(
        &self,
        targets: [(i32, i32); 2],
        delay: &mut DL,
    ) -> Result<TouchCalibration> {
        let mut raw = [(0, 0); 2];
        for (target, raw) in targets.iter().zip(raw.iter_mut()) {
            let cross = self.show_crosshair(*target).await?;
            let sampled = self.sample_press(delay).await;
            self.remove_crosshair(cross).await;
            *raw = sampled?;
            debug!("target {} raw {}", *target, *raw);
        }
        TouchCalibration::from_two_points(raw[0], targets[0], raw[1], targets[1])
    }

    /// Average the raw readings of one press, from touch to release
    async fn sample_press<DL: DelayNs>(&self, delay: &mut DL) -> Result<(i32, i32)> {
        loop {
            while self.raw_touch().await?.is_none() {
                delay.delay_ms(SAMPLE_PERIOD_MS).await;
            }

            let (mut sum_x, mut sum_y, mut count) = (0i64, 0i64, 0i64);
            while let Some((x, y)) = self.raw_touch().await? {
                sum_x += i64::from(x);
                sum_y += i64::from(y);
                count += 1;
                delay.delay_ms(SAMPLE_PERIOD_MS).await;
            }

            if count >= MIN_SAMPLES {
                return Ok(((sum_x / count) as i32, (sum_y / count) as i32));
            }
            debug!("press too short: {} samples", count);
        }
    }

    async fn show_crosshair(&self, (x, y): (i32, i32)) -> Result<[VisHandle; 2]> {
        let span = 2 * CROSS_ARM + 1;
        self.with_scene(|scene, sink| {
            let horizontal = scene.add(Fill::new(span, 1, Color::WHITE).into(), x - CROSS_ARM, y)?;
            let vertical = match scene.add(Fill::new(1, span, Color::WHITE).into(), x, y - CROSS_ARM) {
                Ok(obj) => obj,
                Err(e) => {
                    let _ = scene.remove(horizontal, sink);
                    return Err(e);
                }
            };
            for obj in [horizontal, vertical] {
                if let Err(e) = scene.show(obj, u32::MAX, sink) {
                    let _ = scene.remove(horizontal, sink);
                    let _ = scene.remove(vertical, sink);
                    return Err(e);
                }
            }
            Ok([horizontal, vertical])
        })
        .await
    }

    async fn remove_crosshair(&self, cross: [VisHandle; 2]) {
        self.with_scene(|scene, sink| {
            for obj in cross {
                let _ = scene.remove(obj, sink);
            }
        })
        .await;
    }
}
