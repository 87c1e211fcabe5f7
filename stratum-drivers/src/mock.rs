//! Bus doubles for driver tests

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;
use heapless::Vec;

/// Byte as seen on the wire, tagged with the D/C level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Command(u8),
    Data(u8),
}

#[derive(Default)]
pub struct Bus {
    pub dc_high: bool,
    pub log: Vec<Wire, 2048>,
    /// Raw 12-bit values returned for touch channel commands (X, Y, Z1)
    pub touch: Option<(u16, u16, u16)>,
}

impl Bus {
    pub fn commands(&self) -> Vec<u8, 64> {
        self.log
            .iter()
            .filter_map(|w| match w {
                Wire::Command(c) => Some(*c),
                Wire::Data(_) => None,
            })
            .collect()
    }

    /// Data bytes that followed the last occurrence of `command`
    pub fn data_after(&self, command: u8) -> Vec<u8, 2048> {
        let start = self
            .log
            .iter()
            .rposition(|w| *w == Wire::Command(command))
            .map_or(self.log.len(), |i| i + 1);
        self.log[start..]
            .iter()
            .map_while(|w| match w {
                Wire::Data(d) => Some(*d),
                Wire::Command(_) => None,
            })
            .collect()
    }

    fn respond(&self, command: u8) -> u16 {
        let (x, y, z1) = self.touch.unwrap_or((0, 0, 0));
        match command & 0x70 {
            0x50 => x,
            0x10 => y,
            0x30 => z1,
            _ => 0,
        }
    }
}

pub struct MockSpi<'a>(pub &'a RefCell<Bus>);

impl SpiErrorType for MockSpi<'_> {
    type Error = Infallible;
}

impl SpiDevice for MockSpi<'_> {
    async fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut bus = self.0.borrow_mut();
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let dc = bus.dc_high;
                    for &b in bytes.iter() {
                        let wire = if dc { Wire::Data(b) } else { Wire::Command(b) };
                        let _ = bus.log.push(wire);
                    }
                }
                Operation::Transfer(read, write) => {
                    let value = bus.respond(write.first().copied().unwrap_or(0)) << 3;
                    read.fill(0);
                    if read.len() >= 3 {
                        read[1] = (value >> 8) as u8;
                        read[2] = value as u8;
                    }
                }
                Operation::Read(read) => read.fill(0),
                Operation::TransferInPlace(_) | Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

pub struct MockPin<'a>(pub &'a RefCell<Bus>);

impl PinErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().dc_high = true;
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}
