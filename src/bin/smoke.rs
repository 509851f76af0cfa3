use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use adb_monkey::app::adb::devices::{list_devices, pick_serial};
use adb_monkey::app::config::load_config;
use adb_monkey::app::logging::init_logging;
use adb_monkey::app::models::ScreenshotResult;
use adb_monkey::app::session::{DeviceSession, SessionOptions};
use adb_monkey::app::transport::AdbTransport;
use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

// Configured through the environment only:
//   ANDROID_SERIAL          device to target (falls back to config, then the only online device)
//   ADB_MONKEY_SMOKE_OUT    directory for artifacts (falls back to screenshot.output_dir, then a temp dir)

#[derive(Serialize)]
struct SmokeSummary {
    tool: &'static str,
    status: &'static str,
    trace_id: String,
    serial: Option<String>,
    adb_program: Option<String>,
    out_dir: String,
    scale: Option<(f64, f64)>,
    artifacts: HashMap<String, String>,
    checks: Vec<SmokeCheck>,
}

#[derive(Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: &'static str, // pass|fail
    duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create dir {}: {err}", path.display()))
}

fn sanitize_filename_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn run_check<T, F>(checks: &mut Vec<SmokeCheck>, name: &'static str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, adb_monkey::AppError>,
{
    let start = Instant::now();
    match f() {
        Ok(value) => {
            checks.push(SmokeCheck {
                name,
                status: "pass",
                duration_ms: start.elapsed().as_millis(),
                error_code: None,
                error: None,
            });
            Some(value)
        }
        Err(err) => {
            checks.push(SmokeCheck {
                name,
                status: "fail",
                duration_ms: start.elapsed().as_millis(),
                error_code: Some(err.code),
                error: Some(err.error),
            });
            None
        }
    }
}

fn finish(summary: SmokeSummary) -> ! {
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).unwrap_or_default()
    );
    std::process::exit(if summary.status == "pass" { 0 } else { 1 });
}

fn main() {
    let trace_id = Uuid::new_v4().to_string();
    let mut checks: Vec<SmokeCheck> = Vec::new();
    let mut artifacts: HashMap<String, String> = HashMap::new();

    let config = run_check(&mut checks, "load_config", || load_config(&trace_id));
    let effective = config.clone().unwrap_or_default();
    init_logging(&effective.logging);

    let out_dir = effective.screenshot.resolve_output_dir(
        std::env::var_os("ADB_MONKEY_SMOKE_OUT").map(PathBuf::from),
        || std::env::temp_dir().join(format!("adb_monkey_smoke_{trace_id}")),
    );
    if let Err(err) = ensure_dir(&out_dir) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let mut summary = SmokeSummary {
        tool: "adb_monkey_smoke",
        status: "fail",
        trace_id: trace_id.clone(),
        serial: None,
        adb_program: None,
        out_dir: out_dir.to_string_lossy().to_string(),
        scale: None,
        artifacts: HashMap::new(),
        checks: Vec::new(),
    };
    let Some(config) = config else {
        summary.checks = checks;
        finish(summary);
    };

    let preferred = std::env::var("ANDROID_SERIAL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| Some(config.adb.serial.clone()));

    let transport = run_check(&mut checks, "resolve_adb", || {
        AdbTransport::from_config(&config, None, &trace_id)
    });
    let Some(transport) = transport else {
        summary.checks = checks;
        finish(summary);
    };
    summary.adb_program = Some(transport.program().to_string());

    let serial = run_check(&mut checks, "list_devices", || {
        let devices = list_devices(transport.program(), &trace_id)?;
        pick_serial(&devices, preferred.as_deref(), &trace_id)
    });
    let Some(serial) = serial else {
        summary.checks = checks;
        finish(summary);
    };
    summary.serial = Some(serial.clone());

    let session = DeviceSession::new(
        transport.clone().with_serial(Some(serial.clone())),
        SessionOptions {
            verbose: config.session.verbose,
            logical_resolution: config.session.logical_resolution(),
            display_id: u32::try_from(config.screenshot.display_id).ok(),
            header_layout: config.screenshot.header_layout(),
            trace_id: Some(trace_id.clone()),
            ..SessionOptions::default()
        },
    );
    let scale = session.scale_factor();
    summary.scale = Some((scale.scale_x(), scale.scale_y()));

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let png_path = out_dir.join(format!(
        "screenshot_{}_{}.png",
        sanitize_filename_component(&serial),
        timestamp
    ));
    let screenshot = run_check(&mut checks, "screencap", || {
        let buffer = session.save_screenshot(&png_path)?;
        Ok(ScreenshotResult {
            serial: Some(serial.clone()),
            output_path: png_path.to_string_lossy().to_string(),
            width: buffer.width(),
            height: buffer.height(),
        })
    });
    if let Some(screenshot) = screenshot {
        let meta_path = out_dir.join("screenshot.json");
        if let Ok(body) = serde_json::to_string_pretty(&screenshot) {
            if fs::write(&meta_path, body).is_ok() {
                artifacts.insert(
                    "screenshot_meta".to_string(),
                    meta_path.to_string_lossy().to_string(),
                );
            }
        }
        artifacts.insert("screenshot".to_string(), screenshot.output_path);
    }

    summary.status = if checks.iter().all(|check| check.status == "pass") {
        "pass"
    } else {
        "fail"
    };
    summary.artifacts = artifacts;
    summary.checks = checks;
    finish(summary);
}
