pub mod adb;
pub mod config;
pub mod error;
pub mod keycode;
pub mod logging;
pub mod models;
pub mod screen;
pub mod session;
pub mod transport;
