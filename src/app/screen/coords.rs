use serde::{Deserialize, Serialize};

use crate::app::screen::calibration::ScaleFactor;

/// A coordinate in the resolution the automation was written against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LogicalPoint {
    pub x: f64,
    pub y: f64,
}

impl LogicalPoint {
    pub fn new(x: impl Into<f64>, y: impl Into<f64>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// A coordinate on the device's physical display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

/// Scales a logical point, truncating toward zero.
pub fn map_point(point: LogicalPoint, scale: ScaleFactor) -> DevicePoint {
    DevicePoint {
        x: (point.x * scale.scale_x()) as i32,
        y: (point.y * scale.scale_y()) as i32,
    }
}
