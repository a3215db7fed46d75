// THEORY:
// The `pipeline` module is the top-level API of the tracker. It ties the
// analytical stages together into a single control step, the *tick*, and owns
// the schedule that repeats it.
//
// A tick is a straight line through the stack:
//   snapshot state -> capture -> color mask -> largest blob -> displacement
//   -> pointer move -> status report -> poll stop signal
//
// Key architectural principles:
// 1.  **Two States**: The loop is either Idle or Tracking, mirrored by the
//     `active` flag of the control panel. Ticks only run while Tracking.
// 2.  **Disposable Ticks**: A capture or input failure ends the current tick,
//     becomes an error status, and changes nothing else. The next tick starts
//     from scratch. The only ways out of Tracking are an explicit deactivate
//     and the stop signal.
// 3.  **No Overlap**: Ticks are awaited one after another on a fixed-period
//     interval. A slow tick delays the following ones; it never runs alongside
//     them.
// 4.  **Bounded Capture**: The capture call is wrapped in a timeout, so a stuck
//     backend turns into an ordinary recoverable tick error.
// 5.  **Idle Wins**: The move uses the snapshot taken at tick start, but the
//     tick's status text is dropped if tracking was switched off meanwhile.

use crate::config::TrackerConfig;
use crate::control::{ControlPanel, StatusReport, TrackerState};
use crate::core_modules::aim_vector::{Displacement, compute_displacement, screen_center};
use crate::core_modules::blob_locator::{Centroid, blob_locator};
use crate::core_modules::color_mask::compute_mask;
use crate::devices::{DisplayCapture, DisplayGeometry, PointerDevice, StopSignal};
use crate::error::{CaptureError, TickError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Tracking was off; nothing was captured or moved.
    Inactive,
    /// A frame was analyzed but no pixel matched the target color.
    NoTarget,
    /// The pointer was moved toward the largest matching blob.
    TargetAcquired {
        centroid: Centroid,
        displacement: Displacement,
    },
    /// The tick failed and was abandoned; tracking continues.
    Failed(TickError),
}

/// The result of one tick, including whether it ended the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub report: Report,
    pub stop_requested: bool,
}

/// The scheduled control step and everything it talks to.
pub struct TrackingLoop<D, P, S> {
    panel: ControlPanel,
    display: D,
    pointer: P,
    stop: S,
    tick_period: Duration,
    capture_timeout: Duration,
    move_duration: Duration,
}

impl<D, P, S> TrackingLoop<D, P, S>
where
    D: DisplayCapture + DisplayGeometry,
    P: PointerDevice,
    S: StopSignal,
{
    pub fn new(panel: ControlPanel, display: D, pointer: P, stop: S, config: &TrackerConfig) -> Self {
        Self {
            panel,
            display,
            pointer,
            stop,
            tick_period: config.tick_period,
            capture_timeout: config.capture_timeout,
            move_duration: config.move_duration,
        }
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    /// Runs one control step against a snapshot of the current state.
    pub async fn tick(&mut self) -> TickOutcome {
        let state = self.panel.snapshot();
        if !state.active() {
            return TickOutcome {
                report: Report::Inactive,
                stop_requested: false,
            };
        }

        let report = match self.track(&state).await {
            Ok(Some((centroid, displacement))) => {
                self.panel.report_tick_status(StatusReport::Tracking(centroid));
                Report::TargetAcquired {
                    centroid,
                    displacement,
                }
            }
            Ok(None) => Report::NoTarget,
            Err(err) => {
                self.panel.report_tick_status(StatusReport::Error(err.to_string()));
                Report::Failed(err)
            }
        };

        // The stop signal is polled once, after the tick body, whatever happened.
        let stop_requested = self.stop.is_stop_requested();
        if stop_requested {
            self.panel.stop_by_user();
        }

        TickOutcome {
            report,
            stop_requested,
        }
    }

    async fn track(&mut self, state: &TrackerState) -> Result<Option<(Centroid, Displacement)>, TickError> {
        // --- Stage 1: Capture ---
        let frame = tokio::time::timeout(self.capture_timeout, self.display.capture_frame())
            .await
            .map_err(|_| CaptureError::Timeout(self.capture_timeout))??;

        // --- Stage 2: Color Mask ---
        let mask = compute_mask(&frame, state.target_color(), state.threshold());
        drop(frame);

        // --- Stage 3: Blob Location ---
        let Some(centroid) = blob_locator::largest_blob_centroid(&mask) else {
            return Ok(None);
        };

        // --- Stage 4: Aim ---
        let (width, height) = self.display.screen_size();
        let displacement =
            compute_displacement(centroid, screen_center(width, height), state.sensitivity());
        self.pointer
            .move_relative(displacement.dx, displacement.dy, self.move_duration)
            .await?;

        Ok(Some((centroid, displacement)))
    }

    /// Ticks on a fixed period until tracking goes idle, either through the
    /// control panel or the stop signal. Returns the number of ticks run.
    pub async fn run_session(&mut self) -> u64 {
        let mut active = self.panel.subscribe_active();
        let mut interval = tokio::time::interval(self.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        while *active.borrow_and_update() {
            tokio::select! {
                _ = interval.tick() => {
                    let outcome = self.tick().await;
                    ticks += 1;
                    if outcome.stop_requested {
                        break;
                    }
                }
                changed = active.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(ticks, "tracking session finished");
        ticks
    }

    /// Sleeps while idle and runs a session each time tracking is activated.
    pub async fn run(&mut self) {
        let mut active = self.panel.subscribe_active();
        loop {
            if active.wait_for(|a| *a).await.is_err() {
                return;
            }
            self.run_session().await;
        }
    }
}
