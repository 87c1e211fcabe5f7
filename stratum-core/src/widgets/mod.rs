//! Stock widgets
//!
//! [`Element`] is the closed set of stock widgets. Applications that need
//! their own widgets wrap it in a larger enum and forward to it.

mod fill;
mod label;
mod picture;
mod tiled_map;

pub use fill::Fill;
pub use label::{Label, LABEL_CAPACITY};
pub use picture::Picture;
pub use tiled_map::{TiledMap, MAX_TILES};

use crate::color::Color;
use crate::geometry::Rect;
use crate::scene::{ActionEvent, Widget};

/// Any stock widget
#[derive(Debug, Clone)]
pub enum Element {
    Fill(Fill),
    Label(Label),
    Picture(Picture),
    TiledMap(TiledMap),
}

impl Widget for Element {
    fn size(&self) -> (i32, i32) {
        match self {
            Element::Fill(w) => w.size(),
            Element::Label(w) => w.size(),
            Element::Picture(w) => w.size(),
            Element::TiledMap(w) => w.size(),
        }
    }

    fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], line: i32, start_x: i32) {
        match self {
            Element::Fill(w) => w.draw_in_buf_w(area, buf, line, start_x),
            Element::Label(w) => w.draw_in_buf_w(area, buf, line, start_x),
            Element::Picture(w) => w.draw_in_buf_w(area, buf, line, start_x),
            Element::TiledMap(w) => w.draw_in_buf_w(area, buf, line, start_x),
        }
    }

    fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], row: i32, start_y: i32) {
        match self {
            Element::Fill(w) => w.draw_in_buf_h(area, buf, row, start_y),
            Element::Label(w) => w.draw_in_buf_h(area, buf, row, start_y),
            Element::Picture(w) => w.draw_in_buf_h(area, buf, row, start_y),
            Element::TiledMap(w) => w.draw_in_buf_h(area, buf, row, start_y),
        }
    }

    fn action(&mut self, area: &Rect, event: &ActionEvent) -> bool {
        match self {
            Element::Fill(w) => w.action(area, event),
            Element::Label(w) => w.action(area, event),
            Element::Picture(w) => w.action(area, event),
            Element::TiledMap(w) => w.action(area, event),
        }
    }
}

impl From<Fill> for Element {
    fn from(w: Fill) -> Self {
        Element::Fill(w)
    }
}

impl From<Label> for Element {
    fn from(w: Label) -> Self {
        Element::Label(w)
    }
}

impl From<Picture> for Element {
    fn from(w: Picture) -> Self {
        Element::Picture(w)
    }
}

impl From<TiledMap> for Element {
    fn from(w: TiledMap) -> Self {
        Element::TiledMap(w)
    }
}
