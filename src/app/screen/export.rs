use std::fs;
use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::app::error::AppError;
use crate::app::screen::capture::PixelBuffer;

pub fn to_rgba_image(buffer: &PixelBuffer, trace_id: &str) -> Result<RgbaImage, AppError> {
    RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.data().to_vec()).ok_or_else(|| {
        AppError::system(
            format!(
                "Pixel data does not fit a {}x{} RGBA image",
                buffer.width(),
                buffer.height()
            ),
            trace_id,
        )
    })
}

pub fn save_png(buffer: &PixelBuffer, path: &Path, trace_id: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            AppError::system(format!("Failed to create output dir: {err}"), trace_id)
        })?;
    }
    let image = to_rgba_image(buffer, trace_id)?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|err| AppError::system(format!("Failed to write screenshot: {err}"), trace_id))
}
