pub mod app;

pub use app::error::AppError;
pub use app::keycode::Key;
pub use app::screen::calibration::{calibrate, Resolution, ScaleFactor};
pub use app::screen::capture::{
    decode_screencap, decode_screencap_with_color_space, CaptureError, HeaderLayout, PixelBuffer,
    PixelFormat,
};
pub use app::screen::coords::{map_point, DevicePoint, LogicalPoint};
pub use app::session::{ActionSet, DeviceSession, SessionOptions};
pub use app::transport::{AdbTransport, Transport};
