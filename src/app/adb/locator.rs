use std::path::{Path, PathBuf};

const SDK_ENV_VARS: [&str; 2] = ["ANDROID_HOME", "ANDROID_SDK_ROOT"];

fn adb_file_name() -> &'static str {
    if cfg!(windows) {
        "adb.exe"
    } else {
        "adb"
    }
}

/// Strips whitespace and one pair of wrapping quotes, as left behind by
/// copy-pasting a path into the config file.
pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn sdk_platform_tools_adb(sdk_root: &Path) -> Option<PathBuf> {
    let candidate = sdk_root.join("platform-tools").join(adb_file_name());
    candidate.is_file().then_some(candidate)
}

/// Picks the adb executable: the configured path, then the SDK named by
/// `ANDROID_HOME`/`ANDROID_SDK_ROOT`, then plain `adb` from `PATH`.
pub fn resolve_adb_program(config_command_path: &str) -> String {
    let sdk_roots = SDK_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var_os(name))
        .map(PathBuf::from)
        .collect::<Vec<_>>();
    resolve_adb_program_from(config_command_path, &sdk_roots)
}

pub fn resolve_adb_program_from(config_command_path: &str, sdk_roots: &[PathBuf]) -> String {
    let normalized = normalize_command_path(config_command_path);
    if !normalized.is_empty() {
        return normalized;
    }
    sdk_roots
        .iter()
        .find_map(|root| sdk_platform_tools_adb(root))
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or_else(|| "adb".to_string())
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("ADB command is empty".to_string());
    }
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("ADB path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err(format!("ADB executable not found at {program}"));
    }
    Ok(())
}
