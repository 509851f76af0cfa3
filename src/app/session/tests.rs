use super::*;

use std::sync::Mutex;

use crate::app::screen::capture::encode_header;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Bytes(Vec<String>),
    Text(Vec<String>),
    Fire(Vec<String>),
}

/// Records every command and answers from canned responses.
#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    display_output: Option<String>,
    packages_output: String,
    install_output: String,
    capture: Vec<u8>,
}

impl RecordingTransport {
    fn with_display(output: &str) -> Self {
        Self {
            display_output: Some(output.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    fn last_fired(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                Call::Fire(args) => Some(args),
                _ => None,
            })
            .expect("a fire-and-forget call")
    }
}

impl Transport for RecordingTransport {
    fn run_capturing_bytes(&self, args: &[String], _trace_id: &str) -> Result<Vec<u8>, AppError> {
        self.calls.lock().expect("calls").push(Call::Bytes(args.to_vec()));
        Ok(self.capture.clone())
    }

    fn run_capturing_text(&self, args: &[String], trace_id: &str) -> Result<String, AppError> {
        self.calls.lock().expect("calls").push(Call::Text(args.to_vec()));
        match args.first().map(String::as_str) {
            Some("shell") if args.get(1).map(String::as_str) == Some("dumpsys") => self
                .display_output
                .clone()
                .ok_or_else(|| AppError::dependency("device offline", trace_id)),
            Some("shell") if args.get(1).map(String::as_str) == Some("pm") => {
                Ok(self.packages_output.clone())
            }
            Some("install") => Ok(self.install_output.clone()),
            _ => Ok(String::new()),
        }
    }

    fn run_fire_and_forget(&self, args: &[String], _trace_id: &str) -> Result<(), AppError> {
        self.calls.lock().expect("calls").push(Call::Fire(args.to_vec()));
        Ok(())
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn scaled_session() -> DeviceSession<RecordingTransport> {
    DeviceSession::new(
        RecordingTransport::with_display("  init=1440x2560 560dpi cur=1440x2560 app=1440x2392"),
        SessionOptions {
            logical_resolution: Resolution::new(1080, 1920),
            trace_id: Some("trace-session".to_string()),
            ..SessionOptions::default()
        },
    )
}

fn plain_session(transport: RecordingTransport) -> DeviceSession<RecordingTransport> {
    DeviceSession::new(transport, SessionOptions::default())
}

#[test]
fn calibrates_once_and_scales_taps() {
    let session = scaled_session();
    assert_eq!(
        session.scale_factor(),
        ScaleFactor::new(0.75, 0.75).expect("scale")
    );

    session.tap(500, 1000).expect("tap");
    session.tap(500, 1000).expect("tap");

    let calls = session.transport().calls();
    assert_eq!(calls[0], Call::Text(args(&["shell", "dumpsys", "window", "displays"])));
    assert_eq!(calls[1], Call::Fire(args(&["shell", "input", "tap", "375", "750"])));
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls.iter().filter(|call| matches!(call, Call::Text(_))).count(),
        1
    );
}

#[test]
fn skips_display_query_without_logical_resolution() {
    let session = plain_session(RecordingTransport::with_display("init=1440x2560"));
    assert_eq!(session.scale_factor(), ScaleFactor::IDENTITY);
    session.tap(10, 20).expect("tap");
    assert_eq!(
        session.transport().calls(),
        vec![Call::Fire(args(&["shell", "input", "tap", "10", "20"]))]
    );
}

#[test]
fn calibration_failures_degrade_to_identity() {
    let options = || SessionOptions {
        logical_resolution: Resolution::new(1080, 1920),
        ..SessionOptions::default()
    };

    let offline = DeviceSession::new(RecordingTransport::default(), options());
    assert_eq!(offline.scale_factor(), ScaleFactor::IDENTITY);

    let garbled = DeviceSession::new(RecordingTransport::with_display("no display info"), options());
    assert_eq!(garbled.scale_factor(), ScaleFactor::IDENTITY);
    garbled.tap(500, 1000).expect("tap");
    assert_eq!(
        garbled.transport().last_fired(),
        args(&["shell", "input", "tap", "500", "1000"])
    );
}

#[test]
fn swipe_scales_both_endpoints_but_not_duration() {
    let session = scaled_session();
    session.swipe(1000, 1500, 0, 1500, Some(300)).expect("swipe");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "swipe", "750", "1125", "0", "1125", "300"])
    );

    session.swipe(0, 0, 100, 100, None).expect("swipe");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "swipe", "0", "0", "75", "75"])
    );
}

#[test]
fn roll_is_scaled() {
    let session = scaled_session();
    session.roll(4, -8).expect("roll");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "roll", "3", "-6"])
    );
}

#[test]
fn builds_plain_input_commands() {
    let session = plain_session(RecordingTransport::default());

    session.press().expect("press");
    assert_eq!(session.transport().last_fired(), args(&["shell", "input", "press"]));

    session.keyevent("HOME", false).expect("keyevent");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "keyevent", "3"])
    );

    session.keyevent(26u32, true).expect("keyevent");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "keyevent", "26", "--longpress"])
    );

    session.text("hello world").expect("text");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "text", "'hello%sworld'"])
    );
}

#[test]
fn rejects_unknown_keys_and_empty_text() {
    let session = plain_session(RecordingTransport::default());
    let err = session.keyevent("NOT_A_KEY", false).expect_err("unknown key");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(session.text("").is_err());
    assert!(session.transport().calls().is_empty());
}

#[test]
fn escapes_quotes_in_text() {
    assert_eq!(escape_input_text("it's"), "'it'\\''s'");
    assert_eq!(escape_input_text("a b c"), "'a%sb%sc'");
}

#[test]
fn builds_activity_commands() {
    let session = plain_session(RecordingTransport::default());
    session
        .start("com.example", ".MainActivity", Some("--ez debug true"))
        .expect("start");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "am", "start", "com.example/.MainActivity", "--ez", "debug", "true"])
    );

    session.stop("com.example").expect("stop");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "am", "force-stop", "com.example"])
    );

    assert!(session.start("", ".Main", None).is_err());
}

#[test]
fn install_skips_listed_package() {
    let session = plain_session(RecordingTransport {
        packages_output: "package:com.example.debug\npackage:com.example\n".to_string(),
        ..RecordingTransport::default()
    });
    assert!(!session.install("/tmp/app.apk", Some("com.example")).expect("install"));
    assert_eq!(
        session.transport().calls(),
        vec![Call::Text(args(&["shell", "pm", "list", "packages", "com.example"]))]
    );
}

#[test]
fn install_runs_when_missing_and_reports_failures() {
    let session = plain_session(RecordingTransport {
        packages_output: "package:com.example.debug\n".to_string(),
        install_output: "Performing Streamed Install\nSuccess\n".to_string(),
        ..RecordingTransport::default()
    });
    assert!(session.install("/tmp/app.apk", Some("com.example")).expect("install"));
    assert_eq!(
        session.transport().calls().last(),
        Some(&Call::Text(args(&["install", "-r", "-d", "-g", "/tmp/app.apk"])))
    );

    let failing = plain_session(RecordingTransport {
        install_output: "Failure [INSTALL_FAILED_OLDER_SDK]\n".to_string(),
        ..RecordingTransport::default()
    });
    let err = failing.install("/tmp/app.apk", None).expect_err("install failure");
    assert_eq!(err.code, "ERR_DEPENDENCY");
    assert!(err.error.contains("INSTALL_FAILED_OLDER_SDK"));
}

#[test]
fn file_transfer_commands() {
    let session = plain_session(RecordingTransport::default());
    session.pull("/sdcard/log.txt", None).expect("pull");
    session.push("local.txt", "/sdcard/local.txt").expect("push");
    session.adb_shell("settings put global window_animation_scale 0").expect("shell");
    assert_eq!(
        session.transport().calls(),
        vec![
            Call::Text(args(&["pull", "/sdcard/log.txt"])),
            Call::Text(args(&["push", "local.txt", "/sdcard/local.txt"])),
            Call::Fire(args(&["shell", "settings put global window_animation_scale 0"])),
        ]
    );

    let err = session.push("local.txt", "sdcard/../x").expect_err("relative remote");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(session.transport().calls().len(), 3);
}

#[test]
fn screencap_decodes_capture() {
    let mut capture = encode_header(2, 1, 1);
    capture.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let session = DeviceSession::new(
        RecordingTransport {
            capture,
            ..RecordingTransport::default()
        },
        SessionOptions {
            display_id: Some(2),
            ..SessionOptions::default()
        },
    );

    let buffer = session.screencap().expect("screencap");
    assert_eq!((buffer.width(), buffer.height()), (2, 1));
    assert_eq!(buffer.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(
        session.transport().calls(),
        vec![Call::Bytes(args(&["exec-out", "screencap", "-d", "2"]))]
    );
}

#[test]
fn screencap_honours_configured_header_layout() {
    let mut capture = encode_header(1, 1, 1);
    capture.extend_from_slice(&[9, 9, 9, 9, 10, 20, 30, 40]);

    let standard = plain_session(RecordingTransport {
        capture: capture.clone(),
        ..RecordingTransport::default()
    });
    assert_eq!(
        standard.screencap().expect("standard").pixel(0, 0),
        Some([9, 9, 9, 9])
    );

    let color_space = DeviceSession::new(
        RecordingTransport {
            capture,
            ..RecordingTransport::default()
        },
        SessionOptions {
            header_layout: HeaderLayout::WithColorSpace,
            ..SessionOptions::default()
        },
    );
    assert_eq!(
        color_space.screencap().expect("color space").pixel(0, 0),
        Some([10, 20, 30, 40])
    );
}

#[test]
fn screencap_errors_leave_scale_untouched() {
    let mut capture = encode_header(2, 1, 4);
    capture.extend_from_slice(&[0; 8]);
    let mut transport = RecordingTransport::with_display("init=1440x2560");
    transport.capture = capture;
    let session = DeviceSession::new(
        transport,
        SessionOptions {
            logical_resolution: Resolution::new(1080, 1920),
            trace_id: Some("trace-cap".to_string()),
            ..SessionOptions::default()
        },
    );

    let err = session.screencap().expect_err("unsupported format");
    assert_eq!(err.code, "ERR_UNSUPPORTED_PIXEL_FORMAT");
    assert_eq!(err.trace_id, "trace-cap");
    assert_eq!(session.scale_factor().scale_x(), 0.75);

    session.tap(500, 1000).expect("tap");
    assert_eq!(
        session.transport().last_fired(),
        args(&["shell", "input", "tap", "375", "750"])
    );
}

#[test]
fn truncated_capture_is_malformed() {
    let mut capture = encode_header(4, 4, 1);
    capture.extend_from_slice(&[0; 10]);
    let session = plain_session(RecordingTransport {
        capture,
        ..RecordingTransport::default()
    });
    let err = session.screencap().expect_err("short payload");
    assert_eq!(err.code, "ERR_MALFORMED_CAPTURE");
}

#[test]
fn named_actions_drive_the_session() {
    let actions = ActionSet::<RecordingTransport>::new()
        .with("go_left", |session| session.swipe(1000, 1500, 0, 1500, None))
        .with("attack", |session| session.tap(500, 1500))
        .with("combo", |session| {
            session.perform("attack")?;
            session.perform("go_left")
        });
    let session = DeviceSession::new(
        RecordingTransport::default(),
        SessionOptions {
            actions,
            ..SessionOptions::default()
        },
    );

    assert_eq!(session.action_names(), vec!["attack", "combo", "go_left"]);
    session.perform("combo").expect("combo");
    assert_eq!(
        session.transport().calls(),
        vec![
            Call::Fire(args(&["shell", "input", "tap", "500", "1500"])),
            Call::Fire(args(&["shell", "input", "swipe", "1000", "1500", "0", "1500"])),
        ]
    );

    let err = session.perform("missing").expect_err("unknown action");
    assert_eq!(err.code, "ERR_VALIDATION");
}

#[test]
fn sessions_can_be_shared_across_threads() {
    let session = Arc::new(scaled_session());
    let handles = (0..4)
        .map(|index| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.tap(100 * index, 100 * index))
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().expect("join").expect("tap");
    }
    let fired = session
        .transport()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Fire(_)))
        .count();
    assert_eq!(fired, 4);
}

#[test]
fn generates_trace_id_when_missing() {
    let session = plain_session(RecordingTransport::default());
    assert!(!session.trace_id().is_empty());
    assert_ne!(session.trace_id(), plain_session(RecordingTransport::default()).trace_id());
}
