pub mod calibration;
pub mod capture;
pub mod coords;
pub mod export;
