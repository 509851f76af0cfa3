//! Device session: the command layer that turns automation calls into adb
//! commands, applying the session scale to every pointer coordinate.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::adb::parse::parse_package_listed;
use crate::app::adb::paths::validate_device_path;
use crate::app::error::AppError;
use crate::app::keycode::Key;
use crate::app::screen::calibration::{calibrate, Resolution, ScaleFactor};
use crate::app::screen::capture::{decode_screencap_with_layout, HeaderLayout, PixelBuffer};
use crate::app::screen::coords::{map_point, DevicePoint, LogicalPoint};
use crate::app::screen::export::save_png;
use crate::app::transport::Transport;

pub type Action<T> = Arc<dyn Fn(&DeviceSession<T>) -> Result<(), AppError> + Send + Sync>;

/// Named automation steps supplied when the session is created, e.g.
/// `"attack"` -> tap the attack button.
pub struct ActionSet<T> {
    actions: HashMap<String, Action<T>>,
}

impl<T> Default for ActionSet<T> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }
}

impl<T> ActionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&DeviceSession<T>) -> Result<(), AppError> + Send + Sync + 'static,
    {
        self.insert(name, action);
        self
    }

    /// Registers `action`, replacing any action with the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(&DeviceSession<T>) -> Result<(), AppError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.actions.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    fn get(&self, name: &str) -> Option<Action<T>> {
        self.actions.get(name).cloned()
    }
}

pub struct SessionOptions<T> {
    /// Logs every dispatched command at `info` instead of `debug`.
    pub verbose: bool,
    /// Resolution the coordinates are written against. `None` disables scaling.
    pub logical_resolution: Option<Resolution>,
    /// Display passed to `screencap -d`.
    pub display_id: Option<u32>,
    /// Header layout the device's `screencap` writes.
    pub header_layout: HeaderLayout,
    pub actions: ActionSet<T>,
    pub trace_id: Option<String>,
}

impl<T> Default for SessionOptions<T> {
    fn default() -> Self {
        Self {
            verbose: false,
            logical_resolution: None,
            display_id: None,
            header_layout: HeaderLayout::Standard,
            actions: ActionSet::default(),
            trace_id: None,
        }
    }
}

pub struct DeviceSession<T> {
    transport: T,
    scale: ScaleFactor,
    display_id: Option<u32>,
    header_layout: HeaderLayout,
    actions: ActionSet<T>,
    verbose: bool,
    trace_id: String,
}

fn to_args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Prepares text for `input text`: spaces become `%s` and the result is
/// single-quoted for the device shell.
pub fn escape_input_text(text: &str) -> String {
    let encoded = text.replace(' ', "%s").replace('\'', "'\\''");
    format!("'{encoded}'")
}

fn ensure_non_empty(value: &str, field: &str, trace_id: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required"), trace_id));
    }
    Ok(())
}

fn ensure_device_path(path: &str, trace_id: &str) -> Result<(), AppError> {
    validate_device_path(path).map_err(|message| AppError::validation(message, trace_id))
}

const DISPLAY_QUERY: [&str; 4] = ["shell", "dumpsys", "window", "displays"];

fn calibrate_with<T: Transport>(
    transport: &T,
    logical: Option<Resolution>,
    trace_id: &str,
) -> ScaleFactor {
    let Some(logical) = logical else {
        return ScaleFactor::IDENTITY;
    };
    let output = match transport.run_capturing_text(&to_args(&DISPLAY_QUERY), trace_id) {
        Ok(output) => output,
        Err(err) => {
            warn!(trace_id = %trace_id, error = %err, "display query failed; coordinates stay unscaled");
            return ScaleFactor::IDENTITY;
        }
    };
    let scale = calibrate(Some(logical), &output);
    if scale.is_identity() {
        debug!(trace_id = %trace_id, "no display init resolution found; coordinates stay unscaled");
    } else {
        info!(
            trace_id = %trace_id,
            scale_x = scale.scale_x(),
            scale_y = scale.scale_y(),
            "calibrated coordinate scale"
        );
    }
    scale
}

impl<T: Transport> DeviceSession<T> {
    /// Creates a session. With a logical resolution set, this issues the one
    /// display query used to derive the scale.
    pub fn new(transport: T, options: SessionOptions<T>) -> Self {
        let trace_id = options
            .trace_id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let scale = calibrate_with(&transport, options.logical_resolution, &trace_id);
        Self {
            transport,
            scale,
            display_id: options.display_id,
            header_layout: options.header_layout,
            actions: options.actions,
            verbose: options.verbose,
            trace_id,
        }
    }

    pub fn scale_factor(&self) -> ScaleFactor {
        self.scale
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.names()
    }

    pub fn map(&self, x: impl Into<f64>, y: impl Into<f64>) -> DevicePoint {
        map_point(LogicalPoint::new(x, y), self.scale)
    }

    fn log_command(&self, args: &[String]) {
        let command = args.join(" ");
        if self.verbose {
            info!(trace_id = %self.trace_id, command = %command, "Run command");
        } else {
            debug!(trace_id = %self.trace_id, command = %command, "Run command");
        }
    }

    fn fire(&self, args: Vec<String>) -> Result<(), AppError> {
        self.log_command(&args);
        self.transport.run_fire_and_forget(&args, &self.trace_id)
    }

    fn capture_text(&self, args: Vec<String>) -> Result<String, AppError> {
        self.log_command(&args);
        self.transport.run_capturing_text(&args, &self.trace_id)
    }

    /// Runs a named action registered through [`ActionSet`].
    pub fn perform(&self, name: &str) -> Result<(), AppError> {
        let action = self.actions.get(name).ok_or_else(|| {
            AppError::validation(format!("Unknown action: {name}"), &self.trace_id)
        })?;
        debug!(trace_id = %self.trace_id, action = %name, "perform");
        action(self)
    }

    pub fn text(&self, text: &str) -> Result<(), AppError> {
        if text.is_empty() {
            return Err(AppError::validation("text is required", &self.trace_id));
        }
        self.fire(vec![
            "shell".to_string(),
            "input".to_string(),
            "text".to_string(),
            escape_input_text(text),
        ])
    }

    pub fn keyevent(&self, key: impl Into<Key>, longpress: bool) -> Result<(), AppError> {
        let key = key.into();
        let code = key.resolve().ok_or_else(|| {
            AppError::validation(format!("Unknown keycode: {key:?}"), &self.trace_id)
        })?;
        let mut args = to_args(&["shell", "input", "keyevent"]);
        args.push(code.to_string());
        if longpress {
            args.push("--longpress".to_string());
        }
        self.fire(args)
    }

    pub fn tap(&self, x: impl Into<f64>, y: impl Into<f64>) -> Result<(), AppError> {
        let point = self.map(x, y);
        let mut args = to_args(&["shell", "input", "tap"]);
        args.push(point.x.to_string());
        args.push(point.y.to_string());
        self.fire(args)
    }

    /// Swipes between two logical points. Each endpoint is scaled on its own;
    /// the duration is passed through unchanged.
    pub fn swipe(
        &self,
        x1: impl Into<f64>,
        y1: impl Into<f64>,
        x2: impl Into<f64>,
        y2: impl Into<f64>,
        duration_ms: Option<u32>,
    ) -> Result<(), AppError> {
        let from = self.map(x1, y1);
        let to = self.map(x2, y2);
        let mut args = to_args(&["shell", "input", "swipe"]);
        args.extend([from.x, from.y, to.x, to.y].iter().map(i32::to_string));
        if let Some(duration) = duration_ms {
            args.push(duration.to_string());
        }
        self.fire(args)
    }

    pub fn press(&self) -> Result<(), AppError> {
        self.fire(to_args(&["shell", "input", "press"]))
    }

    pub fn roll(&self, dx: impl Into<f64>, dy: impl Into<f64>) -> Result<(), AppError> {
        let delta = self.map(dx, dy);
        let mut args = to_args(&["shell", "input", "roll"]);
        args.push(delta.x.to_string());
        args.push(delta.y.to_string());
        self.fire(args)
    }

    pub fn wait(&self, millis: u64) {
        std::thread::sleep(Duration::from_millis(millis));
    }

    pub fn start(&self, package: &str, activity: &str, options: Option<&str>) -> Result<(), AppError> {
        ensure_non_empty(package, "package", &self.trace_id)?;
        ensure_non_empty(activity, "activity", &self.trace_id)?;
        let mut args = to_args(&["shell", "am", "start"]);
        args.push(format!("{}/{}", package.trim(), activity.trim()));
        if let Some(options) = options {
            args.extend(options.split_whitespace().map(str::to_string));
        }
        self.fire(args)
    }

    pub fn stop(&self, package: &str) -> Result<(), AppError> {
        ensure_non_empty(package, "package", &self.trace_id)?;
        let mut args = to_args(&["shell", "am", "force-stop"]);
        args.push(package.trim().to_string());
        self.fire(args)
    }

    pub fn is_installed(&self, package: &str) -> Result<bool, AppError> {
        ensure_non_empty(package, "package", &self.trace_id)?;
        let mut args = to_args(&["shell", "pm", "list", "packages"]);
        args.push(package.trim().to_string());
        let output = self.capture_text(args)?;
        Ok(parse_package_listed(&output, package))
    }

    /// Installs the APK at `path`, replacing, downgrading and granting runtime
    /// permissions. When `package` is given and already installed nothing is
    /// done. Returns whether an install ran.
    pub fn install(&self, path: &str, package: Option<&str>) -> Result<bool, AppError> {
        ensure_non_empty(path, "path", &self.trace_id)?;
        if let Some(package) = package.filter(|value| !value.trim().is_empty()) {
            if self.is_installed(package)? {
                debug!(trace_id = %self.trace_id, package = %package, "already installed; skipping");
                return Ok(false);
            }
        }
        let mut args = to_args(&["install", "-r", "-d", "-g"]);
        args.push(path.to_string());
        let output = self.capture_text(args)?;
        if let Some(line) = output.lines().find(|line| line.trim_start().starts_with("Failure")) {
            return Err(AppError::dependency(
                format!("Install failed: {}", line.trim()),
                &self.trace_id,
            ));
        }
        Ok(true)
    }

    pub fn adb_shell(&self, command: &str) -> Result<(), AppError> {
        ensure_non_empty(command, "command", &self.trace_id)?;
        self.fire(vec!["shell".to_string(), command.to_string()])
    }

    pub fn shell_output(&self, command: &str) -> Result<String, AppError> {
        ensure_non_empty(command, "command", &self.trace_id)?;
        self.capture_text(vec!["shell".to_string(), command.to_string()])
    }

    /// Copies `remote` from the device into `local`, or into the current
    /// directory when `local` is `None`.
    pub fn pull(&self, remote: &str, local: Option<&str>) -> Result<(), AppError> {
        ensure_device_path(remote, &self.trace_id)?;
        let mut args = vec!["pull".to_string(), remote.trim().to_string()];
        if let Some(local) = local.filter(|value| !value.trim().is_empty()) {
            args.push(local.to_string());
        }
        self.capture_text(args).map(|_| ())
    }

    pub fn push(&self, local: &str, remote: &str) -> Result<(), AppError> {
        ensure_non_empty(local, "local path", &self.trace_id)?;
        ensure_device_path(remote, &self.trace_id)?;
        self.capture_text(vec!["push".to_string(), local.to_string(), remote.trim().to_string()])
            .map(|_| ())
    }

    /// Captures the current screen as RGBA pixels.
    pub fn screencap(&self) -> Result<PixelBuffer, AppError> {
        let mut args = to_args(&["exec-out", "screencap"]);
        if let Some(display_id) = self.display_id {
            args.push("-d".to_string());
            args.push(display_id.to_string());
        }
        self.log_command(&args);
        let bytes = self.transport.run_capturing_bytes(&args, &self.trace_id)?;
        decode_screencap_with_layout(&bytes, self.header_layout).map_err(|err| {
            warn!(trace_id = %self.trace_id, error = %err, bytes = bytes.len(), "screencap decode failed");
            AppError::capture(&err, &self.trace_id)
        })
    }

    /// Captures the screen and writes it to `path` as PNG.
    pub fn save_screenshot(&self, path: &Path) -> Result<PixelBuffer, AppError> {
        let buffer = self.screencap()?;
        save_png(&buffer, path, &self.trace_id)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests;
