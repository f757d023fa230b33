pub mod capture;
pub mod demo;
pub mod gateway;
pub mod notify;
pub mod state;
pub mod watcher;
