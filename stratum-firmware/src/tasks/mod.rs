//! Embassy async tasks
//!
//! The display task owns rendering and touch; the UI task owns the scene
//! contents and reacts to clicks and timer ticks.

pub mod display;
pub mod tick;
pub mod ui;

pub use display::display_task;
pub use tick::tick_task;
pub use ui::ui_task;
