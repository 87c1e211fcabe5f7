//! Tick task
//!
//! Feeds one timer expiry per second into the UI control queue, which
//! drives the on-screen clock.

use defmt::*;
use embassy_time::Duration;

use stratum_display::TaskTimer;

use crate::channels::UI_CONTROL;

/// Clock update period in seconds
pub const TICK_INTERVAL_S: u64 = 1;

#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut timer = TaskTimer::every(Duration::from_secs(TICK_INTERVAL_S));
    timer.run(&UI_CONTROL).await
}
