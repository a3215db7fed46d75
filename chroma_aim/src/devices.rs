// THEORY:
// The outside world as seen by the tracking loop. Each trait is one
// collaborator the loop talks to during a tick. Platform backends live in
// `crate::platform`; tests use small in-memory fakes.
//
// Anything that may wait on a device is async, so a slow device never stalls
// the runtime thread. The stop signal is the exception: it is a plain flag
// read, and backends that need to talk to a device to fill it do so on their
// own thread.

use crate::core_modules::frame::Frame;
use crate::error::{CaptureError, InputError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Produces one frame of the whole display.
#[async_trait]
pub trait DisplayCapture: Send {
    async fn capture_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Reports the display dimensions in pixels.
pub trait DisplayGeometry {
    fn screen_size(&self) -> (u32, u32);
}

/// Issues relative pointer movements.
///
/// Input handles are often tied to the thread that opened them, so the
/// returned future is not required to be `Send`.
#[async_trait(?Send)]
pub trait PointerDevice {
    /// Moves the pointer by (dx, dy). `duration` is a hint for how long the
    /// move may take; zero means instant.
    async fn move_relative(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<(), InputError>;
}

/// A polled stop condition, such as a held hotkey.
pub trait StopSignal {
    fn is_stop_requested(&mut self) -> bool;
}

/// A stop signal that is raised programmatically. Reading it clears it, so one
/// request stops one tracking session.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    raised: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }
}

impl StopSignal for StopFlag {
    fn is_stop_requested(&mut self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }
}

/// Never requests a stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStop;

impl StopSignal for NoStop {
    fn is_stop_requested(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_is_consumed_on_read() {
        let flag = StopFlag::new();
        let mut reader = flag.clone();
        assert!(!reader.is_stop_requested());
        flag.raise();
        assert!(reader.is_stop_requested());
        assert!(!reader.is_stop_requested());
    }

    #[test]
    fn no_stop_never_fires() {
        let mut never = NoStop;
        assert!((0..3).all(|_| !never.is_stop_requested()));
    }
}
