//! Line-oriented terminal front end over the screen controllers.

pub mod app;
pub mod commands;
pub mod render;

pub use app::run;
