//! Display task
//!
//! Renders dirty regions and samples the touch panel.

use defmt::*;

use crate::channels::Display;

#[embassy_executor::task]
pub async fn display_task(display: &'static Display) {
    info!("Display task started");

    // Only returns when the driver was never set up
    match display.run().await {
        Ok(never) => match never {},
        Err(e) => error!("Display driver stopped: {}", e),
    }
}
