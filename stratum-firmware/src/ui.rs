//! Demo screen widgets
//!
//! The firmware extends the stock [`Element`] set with a push button that
//! reports clicks to the UI task.

use defmt::*;

use stratum_core::font::FONT_6X8;
use stratum_core::widgets::{Element, Fill, Label, Picture, TiledMap};
use stratum_core::{ActionEvent, ActionKind, Color, PixelFormat, Rect, Widget};

use crate::channels::{ButtonId, UiMessage, UI_CONTROL};

/// Push button with a centered caption
#[derive(Debug, Clone)]
pub struct Button {
    id: ButtonId,
    caption: Label,
    width: i32,
    height: i32,
    face: Color,
    pressed_face: Color,
    border: Color,
    pressed: bool,
}

impl Button {
    pub fn new(id: ButtonId, caption: &str, width: i32, height: i32) -> Self {
        Self {
            id,
            caption: Label::new(caption, &FONT_6X8, Color::WHITE),
            width,
            height,
            face: Color::DARKCYAN,
            pressed_face: Color::NAVY,
            border: Color::LIGHTGREY,
            pressed: false,
        }
    }

    fn face(&self) -> Color {
        if self.pressed {
            self.pressed_face
        } else {
            self.face
        }
    }

    fn caption_area(&self, area: &Rect) -> Rect {
        let (w, h) = self.caption.size();
        Rect::from_size(
            area.x_start + (area.width() - w) / 2,
            area.y_start + (area.height() - h) / 2,
            w,
            h,
        )
    }

    fn is_edge(area: &Rect, x: i32, y: i32) -> bool {
        x == area.x_start || x == area.x_end || y == area.y_start || y == area.y_end
    }
}

impl Widget for Button {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        if line < area.y_start || line > area.y_end {
            return;
        }
        let Some(span) = area.span_x(start_x, buf.len()) else {
            return;
        };
        let face = self.face();
        for x in span {
            buf[(x - start_x) as usize] = if Self::is_edge(area, x, line) {
                self.border
            } else {
                face
            };
        }
        let caption = self.caption_area(area);
        if line >= caption.y_start && line <= caption.y_end {
            self.caption.draw_in_buf_w(&caption, buf, line, start_x);
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        if row < area.x_start || row > area.x_end {
            return;
        }
        let Some(span) = area.span_y(start_y, buf.len()) else {
            return;
        };
        let face = self.face();
        for y in span {
            buf[(y - start_y) as usize] = if Self::is_edge(area, row, y) {
                self.border
            } else {
                face
            };
        }
        let caption = self.caption_area(area);
        if row >= caption.x_start && row <= caption.x_end {
            self.caption.draw_in_buf_h(&caption, buf, row, start_y);
        }
    }

    fn action(&mut self, _area: &Rect, event: &ActionEvent) -> bool {
        match event.kind {
            ActionKind::Touch if !self.pressed => {
                self.pressed = true;
                true
            }
            ActionKind::Untouch if self.pressed => {
                self.pressed = false;
                if UI_CONTROL.try_send(UiMessage::Clicked(self.id)).is_err() {
                    warn!("click on {} dropped, UI queue full", self.id);
                }
                true
            }
            ActionKind::MoveOut if self.pressed => {
                self.pressed = false;
                true
            }
            _ => false,
        }
    }
}

/// Widgets of the demo screen
#[derive(Debug, Clone)]
pub enum UiWidget {
    Element(Element),
    Button(Button),
}

impl UiWidget {
    /// Stock label, for text updates
    pub fn label_mut(&mut self) -> Option<&mut Label> {
        match self {
            UiWidget::Element(Element::Label(label)) => Some(label),
            _ => None,
        }
    }
}

impl Widget for UiWidget {
    fn size(&self) -> (i32, i32) {
        match self {
            UiWidget::Element(w) => w.size(),
            UiWidget::Button(w) => w.size(),
        }
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        match self {
            UiWidget::Element(w) => w.draw_in_buf_w(area, buf, line, start_x),
            UiWidget::Button(w) => w.draw_in_buf_w(area, buf, line, start_x),
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        match self {
            UiWidget::Element(w) => w.draw_in_buf_h(area, buf, row, start_y),
            UiWidget::Button(w) => w.draw_in_buf_h(area, buf, row, start_y),
        }
    }

    fn action(&mut self, area: &Rect, event: &ActionEvent) -> bool {
        match self {
            UiWidget::Element(w) => w.action(area, event),
            UiWidget::Button(w) => w.action(area, event),
        }
    }
}

macro_rules! from_element {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for UiWidget {
                fn from(w: $ty) -> Self {
                    UiWidget::Element(w.into())
                }
            }
        )*
    };
}

from_element!(Fill, Label, Picture, TiledMap);

impl From<Element> for UiWidget {
    fn from(w: Element) -> Self {
        UiWidget::Element(w)
    }
}

impl From<Button> for UiWidget {
    fn from(w: Button) -> Self {
        UiWidget::Button(w)
    }
}
