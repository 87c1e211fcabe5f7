//! Recording panel, touch controller and widget for pipeline tests

use core::cell::RefCell;

use embassy_futures::yield_now;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use stratum_core::config::TouchCalibration;
use stratum_core::traits::{DisplayDevice, Rotation, TouchDevice};
use stratum_core::{ActionEvent, ActionKind, Color, Error, PixelFormat, Rect, Result, Widget};

/// Panel size in `Rotation::Top`
pub const NATIVE_W: i32 = 32;
pub const NATIVE_H: i32 = 24;

const FB_SIDE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Window(Rect),
    WriteStart(i32),
    WriteEnd(i32),
    Stop,
    /// A line buffer went through `prepare_data`
    Prepare,
    /// Widget tag and the line (or column) it drew
    Draw(u8, i32),
    Action(u8, ActionKind),
}

/// Everything the doubles observe, shared through a `RefCell`
pub struct Log {
    pub events: Vec<Event, 1024>,
    /// Panel memory, `[y][x]` in the current panel rotation
    pub fb: [[Color; FB_SIDE]; FB_SIDE],
    /// Yields inside every line transfer
    pub write_yields: usize,
    /// The transfer of this window line fails, once
    pub fail_write: Option<i32>,
    /// Panel wants line buffers prepared (red and blue swapped)
    pub prepare: bool,
    pub rotation: Rotation,
    pub inverted: bool,
    /// Calibrated touch point
    pub touch: Option<(i32, i32)>,
    /// Raw touch reading as a function of elapsed delay ticks
    pub raw: fn(u32) -> Option<(i32, i32)>,
    pub ticks: u32,
    pub calibration: Option<TouchCalibration>,
    pub touch_rotation: Rotation,
}

impl Log {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            fb: [[Color::BLACK; FB_SIDE]; FB_SIDE],
            write_yields: 0,
            fail_write: None,
            prepare: false,
            rotation: Rotation::Top,
            inverted: false,
            touch: None,
            raw: |_| None,
            ticks: 0,
            calibration: None,
            touch_rotation: Rotation::Top,
        }
    }

    fn record(&mut self, event: Event) {
        // Long property runs only look at the framebuffer
        let _ = self.events.push(event);
    }
}

pub struct MockPanel<'a> {
    log: &'a RefCell<Log>,
    window: Rect,
    cursor: usize,
    line: i32,
}

impl<'a> MockPanel<'a> {
    pub fn new(log: &'a RefCell<Log>) -> Self {
        Self {
            log,
            window: Rect::new(0, 0, 0, 0),
            cursor: 0,
            line: 0,
        }
    }
}

impl DisplayDevice for MockPanel<'_> {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn set_addr_window(&mut self, x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Result<()> {
        let window = Rect::new(x_start, y_start, x_end, y_end);
        if !window.is_valid() || !Rect::from_size(0, 0, self.width(), self.height()).contains_rect(&window) {
            return Err(Error::BadParameter);
        }
        self.window = window;
        self.cursor = 0;
        self.line = y_start;
        self.log.borrow_mut().record(Event::Window(window));
        Ok(())
    }

    async fn write_stream(&mut self, data: &[Color]) -> Result<()> {
        let yields = {
            let mut log = self.log.borrow_mut();
            log.record(Event::WriteStart(self.line));
            log.write_yields
        };
        for _ in 0..yields {
            yield_now().await;
        }

        let width = self.window.width() as usize;
        let mut log = self.log.borrow_mut();
        if log.fail_write == Some(self.line) {
            log.fail_write = None;
            return Err(Error::Bus);
        }
        for color in data {
            let x = self.window.x_start as usize + self.cursor % width;
            let y = self.window.y_start as usize + self.cursor / width;
            log.fb[y][x] = *color;
            self.cursor += 1;
        }
        log.record(Event::WriteEnd(self.line));
        self.line += 1;
        Ok(())
    }

    async fn stop_transfer(&mut self) -> Result<()> {
        self.log.borrow_mut().record(Event::Stop);
        Ok(())
    }

    async fn set_rotation(&mut self, rotation: Rotation) -> Result<()> {
        self.log.borrow_mut().rotation = rotation;
        Ok(())
    }

    async fn invert_display(&mut self, invert: bool) -> Result<()> {
        self.log.borrow_mut().inverted = invert;
        Ok(())
    }

    fn is_data_need_preparation(&self) -> bool {
        self.log.borrow().prepare
    }

    fn prepare_data(&self, data: &mut [Color]) {
        self.log.borrow_mut().record(Event::Prepare);
        for color in data.iter_mut() {
            let (r, g, b) = color.to_rgb();
            *color = Color::from_rgb(b, g, r);
        }
    }

    fn pixel_data_count(&self) -> usize {
        self.cursor
    }

    fn width(&self) -> i32 {
        if self.log.borrow().rotation.is_transposed() {
            NATIVE_H
        } else {
            NATIVE_W
        }
    }

    fn height(&self) -> i32 {
        if self.log.borrow().rotation.is_transposed() {
            NATIVE_W
        } else {
            NATIVE_H
        }
    }
}

pub struct MockTouch<'a> {
    log: &'a RefCell<Log>,
}

impl<'a> MockTouch<'a> {
    pub fn new(log: &'a RefCell<Log>) -> Self {
        Self { log }
    }
}

impl TouchDevice for MockTouch<'_> {
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get_xy(&mut self) -> Result<Option<(i32, i32)>> {
        Ok(self.log.borrow().touch)
    }

    async fn raw_xy(&mut self) -> Result<Option<(i32, i32)>> {
        let log = self.log.borrow();
        Ok((log.raw)(log.ticks))
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.log.borrow_mut().touch_rotation = rotation;
    }

    fn set_calibration(&mut self, calibration: TouchCalibration) {
        self.log.borrow_mut().calibration = Some(calibration);
    }
}

/// Delay that only advances the tick counter
pub struct MockDelay<'a> {
    log: &'a RefCell<Log>,
}

impl<'a> MockDelay<'a> {
    pub fn new(log: &'a RefCell<Log>) -> Self {
        Self { log }
    }
}

impl DelayNs for MockDelay<'_> {
    async fn delay_ns(&mut self, _ns: u32) {
        self.log.borrow_mut().ticks += 1;
        yield_now().await;
    }

    async fn delay_ms(&mut self, _ms: u32) {
        self.delay_ns(0).await;
    }
}

/// Solid widget that logs every line it draws and every gesture it gets
pub struct Recorder<'a> {
    log: &'a RefCell<Log>,
    tag: u8,
    width: i32,
    height: i32,
    color: Color,
}

impl<'a> Recorder<'a> {
    pub fn new(log: &'a RefCell<Log>, tag: u8, width: i32, height: i32, color: Color) -> Self {
        Self {
            log,
            tag,
            width,
            height,
            color,
        }
    }
}

impl Widget for Recorder<'_> {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        if line < area.y_start || line > area.y_end {
            return;
        }
        self.log.borrow_mut().record(Event::Draw(self.tag, line));
        if let Some(span) = area.span_x(start_x, buf.len()) {
            for x in span {
                buf[(x - start_x) as usize] = self.color;
            }
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        if row < area.x_start || row > area.x_end {
            return;
        }
        self.log.borrow_mut().record(Event::Draw(self.tag, row));
        if let Some(span) = area.span_y(start_y, buf.len()) {
            for y in span {
                buf[(y - start_y) as usize] = self.color;
            }
        }
    }

    fn action(&mut self, _area: &Rect, event: &ActionEvent) -> bool {
        self.log
            .borrow_mut()
            .record(Event::Action(self.tag, event.kind));
        true
    }
}
