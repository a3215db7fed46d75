// THEORY:
// The control surface is the only writer of the tracker's configuration. A UI,
// a hotkey handler, or the shell binary holds a cheap clone of `ControlPanel`
// and calls plain methods on it; there is no registry of callbacks.
//
// Key architectural principles:
// 1.  **Validate at the Boundary**: Threshold and sensitivity are clamped or
//     rejected here, so the tracking loop can trust every snapshot it reads.
// 2.  **Snapshot Reads**: `TrackerState` is a small `Clone` value behind a
//     `parking_lot::RwLock`. The loop copies it once per tick; changes made
//     mid-tick are picked up on the next one.
// 3.  **Activation Mirror**: The `active` flag is also published on a
//     `tokio::sync::watch` channel, written under the state lock, so the
//     scheduler can sleep until tracking is switched on and wake the moment it
//     is switched off.
// 4.  **Status as a Channel**: The latest status text is held in another watch
//     channel. The UI layer subscribes; anyone can read the current text.

use crate::config::TrackerConfig;
use crate::core_modules::blob_locator::Centroid;
use crate::core_modules::color::Color;
use crate::core_modules::frame::Frame;
use crate::error::ConfigError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

pub const THRESHOLD_MIN: i32 = 10;
pub const THRESHOLD_MAX: i32 = 100;
pub const SENSITIVITY_MIN: f64 = 0.1;
pub const SENSITIVITY_MAX: f64 = 1.0;

pub const DEFAULT_THRESHOLD: i32 = 40;
pub const DEFAULT_SENSITIVITY: f64 = 0.7;
/// Magenta; `#8D00C9`.
pub const DEFAULT_TARGET_COLOR: Color = Color::new(141, 0, 201);
pub const DEFAULT_MODE: &str = "Head";

/// Labels for the activation presets. They only name the session.
pub const ASSIST_MODES: [&str; 4] = [
    "Lite AimAssist",
    "Normal AimAssist",
    "Middle AimAssist",
    "Super AimAssist",
];

/// Labels for the aim-point selector. Like the presets, they are labels only.
pub const AIM_MODES: [&str; 3] = ["Head", "Random", "Chests"];

/// The complete, always-valid tracker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    active: bool,
    mode: String,
    target_color: Color,
    threshold: i32,
    sensitivity: f64,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            active: false,
            mode: DEFAULT_MODE.to_string(),
            target_color: DEFAULT_TARGET_COLOR,
            threshold: DEFAULT_THRESHOLD,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl TrackerState {
    /// Builds an inactive state, rejecting any out-of-range value.
    pub fn new(target_color: Color, threshold: i32, sensitivity: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            target_color,
            threshold: check_threshold(threshold)?,
            sensitivity: check_sensitivity(sensitivity)?,
            ..Self::default()
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        Self::new(config.target_color, config.threshold, config.sensitivity)
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn target_color(&self) -> Color {
        self.target_color
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }
}

fn check_threshold(value: i32) -> Result<i32, ConfigError> {
    if (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field: "threshold",
            value: value as f64,
            min: THRESHOLD_MIN as f64,
            max: THRESHOLD_MAX as f64,
        })
    }
}

fn check_sensitivity(value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field: "sensitivity" });
    }
    if (SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field: "sensitivity",
            value,
            min: SENSITIVITY_MIN,
            max: SENSITIVITY_MAX,
        })
    }
}

/// Every status message the tracker can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Ready,
    Activated { mode: String },
    Deactivated,
    ModeSet { mode: String },
    Tracking(Centroid),
    Error(String),
    StoppedByUser,
    SettingsReset,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::Ready => write!(f, "Ready"),
            StatusReport::Activated { mode } => write!(f, "Active: {mode} | Press F8 to stop"),
            StatusReport::Deactivated => write!(f, "Aim assist deactivated"),
            StatusReport::ModeSet { mode } => write!(f, "Mode set to: {mode}"),
            StatusReport::Tracking(c) => write!(f, "Tracking | Target at ({}, {})", c.x, c.y),
            StatusReport::Error(msg) => write!(f, "Error: {msg}"),
            StatusReport::StoppedByUser => write!(f, "Tracking stopped by user"),
            StatusReport::SettingsReset => write!(f, "Settings reset to default"),
        }
    }
}

struct Shared {
    state: RwLock<TrackerState>,
    active_tx: watch::Sender<bool>,
    status_tx: watch::Sender<String>,
}

/// A cloneable handle onto the single process-wide `TrackerState`.
#[derive(Clone)]
pub struct ControlPanel {
    inner: Arc<Shared>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new(TrackerState::default())
    }
}

impl ControlPanel {
    /// Wraps `initial`, which always starts inactive.
    pub fn new(initial: TrackerState) -> Self {
        let state = TrackerState {
            active: false,
            ..initial
        };
        let (active_tx, _) = watch::channel(false);
        let (status_tx, _) = watch::channel(StatusReport::Ready.to_string());
        Self {
            inner: Arc::new(Shared {
                state: RwLock::new(state),
                active_tx,
                status_tx,
            }),
        }
    }

    // --- Transitions ---

    /// Idle -> Tracking.
    pub fn activate(&self, mode: impl Into<String>) {
        let mode = mode.into();
        {
            let mut state = self.inner.state.write();
            state.active = true;
            state.mode = mode.clone();
            self.inner.active_tx.send_replace(true);
        }
        tracing::info!(%mode, "tracking activated");
        self.report_status(StatusReport::Activated { mode });
    }

    /// Tracking -> Idle.
    pub fn deactivate(&self) {
        self.set_inactive();
        tracing::info!("tracking deactivated");
        self.report_status(StatusReport::Deactivated);
    }

    /// Tracking -> Idle, triggered by the stop signal.
    pub fn stop_by_user(&self) {
        self.set_inactive();
        tracing::info!("tracking stopped by stop signal");
        self.report_status(StatusReport::StoppedByUser);
    }

    fn set_inactive(&self) {
        let mut state = self.inner.state.write();
        state.active = false;
        self.inner.active_tx.send_replace(false);
    }

    // --- Setters ---

    /// Changes the mode label without touching activation.
    pub fn set_mode(&self, mode: impl Into<String>) {
        let mode = mode.into();
        self.inner.state.write().mode = mode.clone();
        self.report_status(StatusReport::ModeSet { mode });
    }

    /// Clamps `value` into the threshold range and returns what was stored.
    pub fn set_threshold(&self, value: i32) -> i32 {
        let clamped = value.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        if clamped != value {
            tracing::debug!(value, clamped, "threshold clamped");
        }
        self.inner.state.write().threshold = clamped;
        clamped
    }

    /// Stores `value` only if it is already in range.
    pub fn try_set_threshold(&self, value: i32) -> Result<i32, ConfigError> {
        let value = check_threshold(value)?;
        self.inner.state.write().threshold = value;
        Ok(value)
    }

    /// Clamps a finite `value` into the sensitivity range. NaN and infinities
    /// are rejected and the previous value is kept.
    pub fn set_sensitivity(&self, value: f64) -> Result<f64, ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { field: "sensitivity" });
        }
        let clamped = value.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);
        self.inner.state.write().sensitivity = clamped;
        Ok(clamped)
    }

    pub fn try_set_sensitivity(&self, value: f64) -> Result<f64, ConfigError> {
        let value = check_sensitivity(value)?;
        self.inner.state.write().sensitivity = value;
        Ok(value)
    }

    /// Slider-style setter: `percent` of 70 stores 0.7.
    pub fn set_sensitivity_percent(&self, percent: u32) -> f64 {
        let clamped = (percent as f64 / 100.0).clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);
        self.inner.state.write().sensitivity = clamped;
        clamped
    }

    pub fn set_target_color(&self, color: Color) {
        self.inner.state.write().target_color = color;
        tracing::info!(%color, "target color set");
    }

    /// Takes the target color from a pixel of `frame`, e.g. where the user clicked.
    pub fn sample_target_color(&self, frame: &Frame, x: u32, y: u32) -> Result<Color, ConfigError> {
        let color = frame.pixel(x, y).ok_or(ConfigError::OutOfFrame {
            x,
            y,
            width: frame.width(),
            height: frame.height(),
        })?;
        self.set_target_color(color);
        Ok(color)
    }

    /// Restores the default threshold and sensitivity.
    pub fn reset(&self) {
        {
            let mut state = self.inner.state.write();
            state.threshold = DEFAULT_THRESHOLD;
            state.sensitivity = DEFAULT_SENSITIVITY;
        }
        self.report_status(StatusReport::SettingsReset);
    }

    // --- Readers ---

    /// A copy of the whole state, taken under one lock acquisition.
    pub fn snapshot(&self) -> TrackerState {
        self.inner.state.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.read().active
    }

    /// The most recent status text.
    pub fn status(&self) -> String {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.inner.status_tx.subscribe()
    }

    pub fn subscribe_active(&self) -> watch::Receiver<bool> {
        self.inner.active_tx.subscribe()
    }

    pub fn report_status(&self, report: StatusReport) {
        let text = log_status(&report);
        self.inner.status_tx.send_replace(text);
    }

    /// Publishes the outcome of a tick, unless tracking was switched off while
    /// the tick ran. Returns whether the status was written.
    ///
    /// The read lock is held across the write, so a concurrent deactivate
    /// always publishes its own status last.
    pub fn report_tick_status(&self, report: StatusReport) -> bool {
        let state = self.inner.state.read();
        if !state.active {
            tracing::trace!(status = %report, "tick finished after tracking went idle");
            return false;
        }
        let text = log_status(&report);
        self.inner.status_tx.send_replace(text);
        true
    }
}

fn log_status(report: &StatusReport) -> String {
    let text = report.to_string();
    match report {
        StatusReport::Error(_) => tracing::warn!(status = %text),
        StatusReport::Tracking(_) => tracing::debug!(status = %text),
        _ => tracing::info!(status = %text),
    }
    text
}
