use tracing::info;

use crate::app::adb::parse::parse_adb_devices;
use crate::app::adb::runner::run_command;
use crate::app::error::AppError;
use crate::app::models::DeviceSummary;

pub fn list_devices(program: &str, trace_id: &str) -> Result<Vec<DeviceSummary>, AppError> {
    info!(trace_id = %trace_id, "list_devices");
    let args = vec!["devices".to_string(), "-l".to_string()];
    let output = run_command(program, &args, trace_id)?;
    if !output.success() {
        return Err(AppError::dependency(
            format!("adb devices failed: {}", output.stderr.trim()),
            trace_id,
        ));
    }
    Ok(parse_adb_devices(&output.stdout))
}

/// Chooses the serial a session should target.
///
/// A non-empty `preferred` serial must be online. Without one, exactly one
/// online device must be attached.
pub fn pick_serial(
    devices: &[DeviceSummary],
    preferred: Option<&str>,
    trace_id: &str,
) -> Result<String, AppError> {
    let online = devices
        .iter()
        .filter(|device| device.is_online())
        .collect::<Vec<_>>();

    if let Some(preferred) = preferred.map(str::trim).filter(|value| !value.is_empty()) {
        return online
            .iter()
            .find(|device| device.serial == preferred)
            .map(|device| device.serial.clone())
            .ok_or_else(|| {
                AppError::validation(format!("Device {preferred} is not online"), trace_id)
            });
    }

    match online.as_slice() {
        [] => Err(AppError::validation("No online device attached", trace_id)),
        [only] => Ok(only.serial.clone()),
        _ => Err(AppError::validation(
            "Multiple devices attached; set a serial",
            trace_id,
        )),
    }
}
