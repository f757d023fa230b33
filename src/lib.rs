pub mod config;
pub mod error;
pub mod models;
pub mod screens;
pub mod services;
pub mod ui;
pub mod utils;
