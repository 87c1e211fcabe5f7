//! Stratum - Compositing display firmware
//!
//! Demo firmware for RP2040 boards with an ILI9341 panel and an XPT2046
//! touch controller sharing SPI0. The display task renders dirty regions;
//! the UI task owns the screen contents.
//!
//! Board settings come from display.toml and are compiled in by build.rs.

#![no_std]
#![no_main]

use defmt::*;
use embassy_embedded_hal::shared_bus::asynch::spi::{SpiDevice, SpiDeviceWithConfig};
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::{self, Spi};
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stratum_core::config::{DisplayConfig, UpdateMode};
use stratum_core::traits::Rotation;
use stratum_core::{Color, PixelFormat};
use stratum_drivers::display::ili9341::{NATIVE_HEIGHT, NATIVE_WIDTH};
use stratum_drivers::display::Ili9341;
use stratum_drivers::touch::Xpt2046;

use crate::channels::{Display, SpiBus};

mod assets;
mod channels;
mod tasks;
mod ui;

/// Constants generated from display.toml
mod board {
    use super::{Rotation, UpdateMode};

    include!(concat!(env!("OUT_DIR"), "/board_config.rs"));
}

// Static cells for the shared bus and the driver (must live forever)
static SPI_BUS: StaticCell<SpiBus> = StaticCell::new();
static DISPLAY: StaticCell<Display> = StaticCell::new();

/// Driver configuration from the board settings
fn display_config() -> DisplayConfig {
    let (r, g, b) = board::BACKGROUND;
    DisplayConfig {
        update_mode: board::UPDATE_MODE,
        inverted: board::INVERTED,
        background: Color::from_rgb(r, g, b),
        rotation: board::ROTATION,
        touch: board::TOUCH,
        debug_borders: board::DEBUG_BORDERS,
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stratum firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // SPI0: CLK=GPIO18, MOSI=GPIO19, MISO=GPIO16
    let mut lcd_config = spi::Config::default();
    lcd_config.frequency = board::SPI_FREQUENCY;
    let spi = Spi::new(
        p.SPI0,
        p.PIN_18,
        p.PIN_19,
        p.PIN_16,
        p.DMA_CH0,
        p.DMA_CH1,
        lcd_config,
    );
    let bus: &'static SpiBus = SPI_BUS.init(Mutex::new(spi));

    // Panel: CS=GPIO17, DC=GPIO20
    let lcd_cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_20, Level::Low);
    let panel = Ili9341::new(SpiDevice::new(bus, lcd_cs), dc, Delay);

    let display: &'static Display = DISPLAY.init_with(|| Display::new(display_config()));
    display.set_display_drv(panel).await;

    if board::TOUCH {
        // Touch: CS=GPIO21, at its own (slower) clock
        let mut touch_config = spi::Config::default();
        touch_config.frequency = board::TOUCH_SPI_FREQUENCY;
        let touch_cs = Output::new(p.PIN_21, Level::High);
        let touch = Xpt2046::new(
            SpiDeviceWithConfig::new(bus, touch_cs, touch_config),
            NATIVE_WIDTH,
            NATIVE_HEIGHT,
        );
        display.set_touch_drv(touch).await;
    }

    unwrap!(display.setup().await);
    info!(
        "Display ready: {}x{}, {}",
        display.width(),
        display.height(),
        display.update_mode()
    );

    spawner.spawn(tasks::display_task(display)).unwrap();
    spawner.spawn(tasks::ui_task(display)).unwrap();
    spawner.spawn(tasks::tick_task()).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
