use std::time::Duration;

use tracing::warn;

use crate::app::adb::locator::{resolve_adb_program, validate_adb_program};
use crate::app::adb::runner::{run_command_raw, RawCommandOutput};
use crate::app::config::AppConfig;
use crate::app::error::AppError;

/// Executes adb sub-commands (everything after `adb [-s SERIAL]`).
pub trait Transport {
    /// Runs a command and returns its complete stdout as raw bytes.
    fn run_capturing_bytes(&self, args: &[String], trace_id: &str) -> Result<Vec<u8>, AppError>;

    /// Runs a command and returns its stdout as text.
    fn run_capturing_text(&self, args: &[String], trace_id: &str) -> Result<String, AppError>;

    /// Runs a command whose output is not needed.
    fn run_fire_and_forget(&self, args: &[String], trace_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct AdbTransport {
    program: String,
    serial: Option<String>,
    command_timeout: Duration,
    capture_timeout: Duration,
}

impl AdbTransport {
    pub fn new(program: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial: serial.filter(|value| !value.trim().is_empty()),
            command_timeout: Duration::from_secs(30),
            capture_timeout: Duration::from_secs(60),
        }
    }

    /// Builds a transport from the adb and command settings.
    pub fn from_config(
        config: &AppConfig,
        serial: Option<String>,
        trace_id: &str,
    ) -> Result<Self, AppError> {
        let program = resolve_adb_program(&config.adb.command_path);
        validate_adb_program(&program).map_err(|message| AppError::validation(message, trace_id))?;
        Ok(Self::new(program, serial)
            .with_timeouts(
                config.command.command_timeout(),
                config.command.capture_timeout(),
            ))
    }

    pub fn with_timeouts(mut self, command_timeout: Duration, capture_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self.capture_timeout = capture_timeout;
        self
    }

    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn full_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        full.extend(args.iter().cloned());
        full
    }

    fn run(
        &self,
        args: &[String],
        timeout: Duration,
        trace_id: &str,
    ) -> Result<RawCommandOutput, AppError> {
        let full = self.full_args(args);
        run_command_raw(&self.program, &full, timeout, trace_id)
    }

    fn require_success(
        &self,
        output: RawCommandOutput,
        args: &[String],
        trace_id: &str,
    ) -> Result<RawCommandOutput, AppError> {
        if output.success() {
            return Ok(output);
        }
        Err(AppError::dependency(
            format!(
                "adb {} failed ({:?}): {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.exit_code,
                output.stderr.trim()
            ),
            trace_id,
        ))
    }
}

impl Transport for AdbTransport {
    fn run_capturing_bytes(&self, args: &[String], trace_id: &str) -> Result<Vec<u8>, AppError> {
        let output = self.run(args, self.capture_timeout, trace_id)?;
        Ok(self.require_success(output, args, trace_id)?.stdout)
    }

    fn run_capturing_text(&self, args: &[String], trace_id: &str) -> Result<String, AppError> {
        let output = self.run(args, self.command_timeout, trace_id)?;
        let output = self.require_success(output, args, trace_id)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_fire_and_forget(&self, args: &[String], trace_id: &str) -> Result<(), AppError> {
        let output = self.run(args, self.command_timeout, trace_id)?;
        if !output.success() {
            warn!(
                trace_id = %trace_id,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "adb command exited with failure"
            );
        }
        Ok(())
    }
}
