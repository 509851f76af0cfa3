use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Returns `None` unless both sides are positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

/// Per-axis ratio applied to every pointer coordinate before dispatch.
/// Both factors are finite and strictly positive.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScaleFactor {
    scale_x: f64,
    scale_y: f64,
}

impl ScaleFactor {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// Returns `None` unless both factors are finite and positive.
    pub fn new(scale_x: f64, scale_y: f64) -> Option<Self> {
        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(scale_x) || !valid(scale_y) {
            return None;
        }
        Some(Self { scale_x, scale_y })
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Factors that undo this scaling.
    pub fn invert(&self) -> Self {
        Self {
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
        }
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Finds the first `init=<W>x<H>` in `dumpsys window displays` style output.
pub fn parse_display_init(output: &str) -> Option<Resolution> {
    let init_re = Regex::new(r"init=(\d+)x(\d+)").ok()?;
    let caps = init_re.captures(output)?;
    let width = caps[1].parse::<u32>().ok()?;
    let height = caps[2].parse::<u32>().ok()?;
    Resolution::new(width, height)
}

/// Derives the session scale from the logical resolution and the device's
/// display text. Any missing piece yields [`ScaleFactor::IDENTITY`].
pub fn calibrate(logical: Option<Resolution>, display_output: &str) -> ScaleFactor {
    let Some(logical) = logical else {
        return ScaleFactor::IDENTITY;
    };
    let Some(physical) = parse_display_init(display_output) else {
        return ScaleFactor::IDENTITY;
    };
    ScaleFactor::new(
        f64::from(logical.width) / f64::from(physical.width),
        f64::from(logical.height) / f64::from(physical.height),
    )
    .unwrap_or(ScaleFactor::IDENTITY)
}
