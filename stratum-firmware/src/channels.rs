//! Shared driver types and inter-task queues
//!
//! The display driver itself lives in a `StaticCell` created by `main`;
//! tasks get a `&'static Display`. Everything the UI task waits on goes
//! through [`UI_CONTROL`].

use embassy_embedded_hal::shared_bus::asynch::spi::{SpiDevice, SpiDeviceWithConfig};
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;

use stratum_display::{DisplayDriver, TaskControl};
use stratum_drivers::display::Ili9341;
use stratum_drivers::touch::Xpt2046;

use crate::ui::UiWidget;

/// Scene capacity, root list included
pub const SCENE_OBJECTS: usize = 24;

/// UI control queue depth
const UI_QUEUE_SIZE: usize = 8;

/// SPI0, shared by the panel and the touch controller
pub type SpiBus = Mutex<CriticalSectionRawMutex, Spi<'static, SPI0, Async>>;

pub type Panel = Ili9341<SpiDevice<'static, CriticalSectionRawMutex, Spi<'static, SPI0, Async>, Output<'static>>, Output<'static>, Delay>;

pub type Touch = Xpt2046<SpiDeviceWithConfig<'static, CriticalSectionRawMutex, Spi<'static, SPI0, Async>, Output<'static>>>;

pub type Display = DisplayDriver<CriticalSectionRawMutex, Panel, Touch, UiWidget, SCENE_OBJECTS>;

/// Buttons on the demo screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ButtonId {
    Invert,
    Rotate,
}

/// Messages for the UI task
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum UiMessage {
    /// A button was pressed and released over itself
    Clicked(ButtonId),
}

/// Timer expiries, callbacks and button clicks for the UI task
pub static UI_CONTROL: TaskControl<CriticalSectionRawMutex, UiMessage, UI_QUEUE_SIZE> = TaskControl::new();
