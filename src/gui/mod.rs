//! Window front-end using egui/eframe.
//!
//! Shows both storages as donut charts with the same controller the
//! terminal front-end uses.

mod app;
mod pie;

pub use app::DasifaApp;
