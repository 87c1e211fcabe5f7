//! UI task
//!
//! Builds the demo screen, then serves the UI control queue:
//! - timer expiries update the uptime clock
//! - button clicks invert or rotate the display
//! - callbacks posted by other tasks run here

use core::fmt::Write;

use defmt::*;
use embassy_time::Delay;
use heapless::String;

use stratum_core::font::FONT_6X8;
use stratum_core::widgets::{Fill, Label, Picture, TiledMap};
use stratum_core::{Color, DamageSink, PixelFormat, Result, Scene, VisHandle};
use stratum_display::ControlEvent;

use crate::assets::{LOGO, TILESET, TILE_COUNT, TILE_SIZE};
use crate::board;
use crate::channels::{ButtonId, Display, UiMessage, SCENE_OBJECTS, UI_CONTROL};
use crate::ui::{Button, UiWidget};

const HEADER_HEIGHT: i32 = 20;
const FOOTER_ROWS: i32 = 2;
const BUTTON_WIDTH: i32 = 88;
const BUTTON_HEIGHT: i32 = 40;

/// Handles of everything on the demo screen
struct Screen {
    header: VisHandle,
    bar: VisHandle,
    logo: VisHandle,
    title: VisHandle,
    clock: VisHandle,
    footer: VisHandle,
    invert: VisHandle,
    rotate: VisHandle,
}

type UiScene = Scene<UiWidget, SCENE_OBJECTS>;

impl Screen {
    /// Create and show every object for a `width` x `height` screen
    fn build(scene: &mut UiScene, sink: &mut impl DamageSink, width: i32, height: i32) -> Result<Self> {
        let header = scene.add_list(0, 0, width, HEADER_HEIGHT)?;
        let bar = scene.add(Fill::new(width, HEADER_HEIGHT, Color::NAVY).into(), 0, 0)?;
        let logo = scene.add(Picture::new(&LOGO).into(), 2, 2)?;
        let title = scene.add(Label::new("Stratum", &FONT_6X8, Color::WHITE).into(), 22, 6)?;
        let clock = scene.add(
            Label::new("00:00:00", &FONT_6X8, Color::YELLOW).into(),
            clock_x(width),
            6,
        )?;
        for obj in [bar, logo, title, clock] {
            scene.set_list(obj, header)?;
        }

        let footer = scene.add(footer_map(width)?.into(), 0, footer_y(height))?;
        let invert = scene.add(
            Button::new(ButtonId::Invert, "Invert", BUTTON_WIDTH, BUTTON_HEIGHT).into(),
            0,
            0,
        )?;
        let rotate = scene.add(
            Button::new(ButtonId::Rotate, "Rotate", BUTTON_WIDTH, BUTTON_HEIGHT).into(),
            0,
            0,
        )?;

        let screen = Self {
            header,
            bar,
            logo,
            title,
            clock,
            footer,
            invert,
            rotate,
        };
        screen.place_buttons(scene, sink, width, height)?;

        scene.show(screen.bar, 1, sink)?;
        scene.show(screen.logo, 2, sink)?;
        scene.show(screen.title, 2, sink)?;
        scene.show(screen.clock, 2, sink)?;
        scene.show(screen.header, 10, sink)?;
        scene.show(screen.footer, 1, sink)?;
        scene.show(screen.invert, 5, sink)?;
        scene.show(screen.rotate, 5, sink)?;
        Ok(screen)
    }

    /// Fit the screen to new dimensions after a rotation
    fn relayout(&self, scene: &mut UiScene, sink: &mut impl DamageSink, width: i32, height: i32) -> Result<()> {
        scene.resize_list(self.header, width, HEADER_HEIGHT, sink)?;
        scene.update(self.bar, sink, |w| *w = Fill::new(width, HEADER_HEIGHT, Color::NAVY).into())?;
        scene.move_to(self.clock, clock_x(width), 6, false, sink)?;

        let footer = footer_map(width)?;
        scene.update(self.footer, sink, |w| *w = footer.into())?;
        scene.move_to(self.footer, 0, footer_y(height), false, sink)?;
        self.place_buttons(scene, sink, width, height)
    }

    fn place_buttons(&self, scene: &mut UiScene, sink: &mut impl DamageSink, width: i32, height: i32) -> Result<()> {
        let y = (height - BUTTON_HEIGHT) / 2;
        let gap = (width - 2 * BUTTON_WIDTH) / 3;
        scene.move_to(self.invert, gap, y, false, sink)?;
        scene.move_to(self.rotate, width - gap - BUTTON_WIDTH, y, false, sink)
    }

    fn set_clock(&self, scene: &mut UiScene, sink: &mut impl DamageSink, seconds: u32) -> Result<()> {
        let mut text: String<16> = String::new();
        // Fits: at most 10 digits and two colons
        let _ = core::write!(
            text,
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        scene
            .update(self.clock, sink, |w| match w.label_mut() {
                Some(label) => label.set_text(&text),
                None => Ok(()),
            })
            .and_then(|set| set)
    }
}

fn clock_x(width: i32) -> i32 {
    width - FONT_6X8.text_width("00:00:00") - 4
}

fn footer_y(height: i32) -> i32 {
    height - FOOTER_ROWS * TILE_SIZE
}

/// Ground strip as wide as the screen
fn footer_map(width: i32) -> Result<TiledMap> {
    let cols = (width + TILE_SIZE - 1) / TILE_SIZE;
    let mut map = TiledMap::new(&TILESET, TILE_SIZE, TILE_SIZE, cols, FOOTER_ROWS)?;
    for col in 0..cols {
        let top = if col % 7 == 3 { 2 } else { 1 };
        map.set_tile(col, 0, top % TILE_COUNT)?;
        map.set_tile(col, 1, if col % 2 == 0 { 3 } else { 0 })?;
    }
    Ok(map)
}

#[embassy_executor::task]
pub async fn ui_task(display: &'static Display) {
    info!("UI task started");

    if board::CALIBRATE_ON_BOOT && board::TOUCH {
        match display.touch_calibrate(&mut Delay).await {
            Ok(calibration) => info!("Calibration: {}", calibration),
            Err(e) => warn!("Touch calibration failed: {}", e),
        }
    }

    let (width, height) = (display.width(), display.height());
    let screen = match display
        .with_scene(|scene, sink| Screen::build(scene, sink, width, height))
        .await
    {
        Ok(screen) => screen,
        Err(e) => {
            error!("Failed to build screen: {}", e);
            return;
        }
    };
    info!("Screen ready: {}x{}", width, height);

    let mut uptime: u32 = 0;
    let mut inverted = board::INVERTED;

    loop {
        match UI_CONTROL.receive().await {
            ControlEvent::Timer => {
                uptime = uptime.wrapping_add(1);
                let result = display
                    .with_scene(|scene, sink| screen.set_clock(scene, sink, uptime))
                    .await;
                if let Err(e) = result {
                    warn!("Clock update failed: {}", e);
                }
            }
            ControlEvent::Message(UiMessage::Clicked(ButtonId::Invert)) => {
                inverted = !inverted;
                if let Err(e) = display.invert_display(inverted).await {
                    warn!("Invert failed: {}", e);
                }
            }
            ControlEvent::Message(UiMessage::Clicked(ButtonId::Rotate)) => {
                let rotation = display.rotation().next();
                if let Err(e) = display.set_rotation(rotation).await {
                    warn!("Rotation failed: {}", e);
                    continue;
                }
                let (width, height) = (display.width(), display.height());
                let result = display
                    .with_scene(|scene, sink| screen.relayout(scene, sink, width, height))
                    .await;
                match result {
                    Ok(()) => info!("Rotated to {}: {}x{}", rotation, width, height),
                    Err(e) => warn!("Relayout failed: {}", e),
                }
            }
            ControlEvent::Callback(callback) => callback.call(),
        }
    }
}
