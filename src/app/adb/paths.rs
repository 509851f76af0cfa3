/// Checks a path on the device side of `pull`/`push`.
pub fn validate_device_path(path: &str) -> Result<(), String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("remote path is required".to_string());
    }
    if !trimmed.starts_with('/') {
        return Err(format!("remote path must be absolute: {trimmed}"));
    }
    if trimmed.contains('\0') {
        return Err("remote path contains a NUL byte".to_string());
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err("remote path must not contain '..' segments".to_string());
    }
    Ok(())
}
