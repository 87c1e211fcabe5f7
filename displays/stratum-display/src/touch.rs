//! Touch state tracking
//!
//! Turns successive touch samples into scene gestures.

use stratum_core::config::TouchCalibration;
use stratum_core::traits::{Rotation, TouchDevice};
use stratum_core::{ActionEvent, ActionKind, Result};

/// Last sampled touch state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TouchTracker {
    pressed: bool,
    last: (i32, i32),
}

impl TouchTracker {
    pub(crate) const fn new() -> Self {
        Self {
            pressed: false,
            last: (0, 0),
        }
    }

    /// Feed one sample, returning the gesture it completes
    ///
    /// Presence changes give `Touch`/`Untouch`; while pressed a changed
    /// position gives `Move` and an unchanged one `Hold`. `Untouch` is
    /// reported at the last pressed position.
    pub(crate) fn track(&mut self, sample: Option<(i32, i32)>) -> Option<ActionEvent> {
        let (prev_x, prev_y) = self.last;
        let event = |kind, (x, y): (i32, i32)| ActionEvent {
            kind,
            x,
            y,
            prev_x,
            prev_y,
        };

        match (self.pressed, sample) {
            (false, None) => None,
            (false, Some(point)) => {
                self.pressed = true;
                self.last = point;
                Some(ActionEvent {
                    kind: ActionKind::Touch,
                    x: point.0,
                    y: point.1,
                    prev_x: point.0,
                    prev_y: point.1,
                })
            }
            (true, None) => {
                self.pressed = false;
                Some(event(ActionKind::Untouch, self.last))
            }
            (true, Some(point)) => {
                let kind = if point == self.last {
                    ActionKind::Hold
                } else {
                    ActionKind::Move
                };
                self.last = point;
                Some(event(kind, point))
            }
        }
    }

    /// Current position while pressed
    pub(crate) fn position(&self) -> Option<(i32, i32)> {
        self.pressed.then_some(self.last)
    }
}

/// Touch device for boards without a touch panel
///
/// Never reports a press.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTouch;

impl TouchDevice for NoTouch {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get_xy(&mut self) -> Result<Option<(i32, i32)>> {
        Ok(None)
    }

    async fn raw_xy(&mut self) -> Result<Option<(i32, i32)>> {
        Ok(None)
    }

    fn set_rotation(&mut self, _rotation: Rotation) {}

    fn set_calibration(&mut self, _calibration: TouchCalibration) {}
}
