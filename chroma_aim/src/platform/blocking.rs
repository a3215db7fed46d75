// THEORY:
// Native capture calls block, so they run on tokio's blocking pool. The tick
// bounds the wait with a timeout, but a blocking call cannot be cancelled: a
// grab that timed out keeps its thread until the backend answers.
//
// `BlockingGrab` allows at most one such call in flight. While an earlier grab
// is still running, new captures fail fast instead of queueing another call
// behind the same stalled backend. A grab that finished after its tick gave
// up is stale and is discarded.

use crate::core_modules::frame::Frame;
use crate::error::CaptureError;
use tokio::task::JoinHandle;

pub const GRAB_IN_PROGRESS: &str = "previous capture still in progress";

#[derive(Debug, Default)]
pub struct BlockingGrab {
    pending: Option<JoinHandle<Result<Frame, CaptureError>>>,
}

impl BlockingGrab {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a grab started earlier has not returned yet.
    pub fn is_busy(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Runs `grab` on the blocking pool and waits for it.
    ///
    /// If this future is dropped mid-wait the handle stays here, so the next
    /// call can tell the grab is still running.
    pub async fn run<F>(&mut self, grab: F) -> Result<Frame, CaptureError>
    where
        F: FnOnce() -> Result<Frame, CaptureError> + Send + 'static,
    {
        if self.is_busy() {
            return Err(CaptureError::Backend(GRAB_IN_PROGRESS.into()));
        }

        let handle = self.pending.insert(tokio::task::spawn_blocking(grab));
        let joined = handle.await;
        self.pending = None;

        joined.map_err(|e| CaptureError::Backend(format!("capture task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::Color;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn quick_grab_returns_its_frame() {
        let mut grab = BlockingGrab::new();
        let frame = grab.run(|| Ok(Frame::filled(3, 2, Color::new(1, 2, 3)))).await.unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert!(!grab.is_busy());
    }

    #[tokio::test]
    async fn stalled_grab_is_not_stacked() {
        let mut grab = BlockingGrab::new();
        let (release, gate) = mpsc::channel::<()>();

        let first = tokio::time::timeout(
            Duration::from_millis(20),
            grab.run(move || {
                let _ = gate.recv();
                Ok(Frame::filled(8, 8, Color::new(9, 9, 9)))
            }),
        )
        .await;
        assert!(first.is_err());
        assert!(grab.is_busy());

        let calls = Arc::new(AtomicUsize::new(0));
        let second = {
            let calls = Arc::clone(&calls);
            grab.run(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Frame::filled(1, 1, Color::default()))
            })
            .await
        };
        assert_eq!(second.unwrap_err(), CaptureError::Backend(GRAB_IN_PROGRESS.into()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        release.send(()).unwrap();
        while grab.is_busy() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // The stale 8x8 frame from the stalled grab is never handed out.
        let third = grab.run(|| Ok(Frame::filled(2, 2, Color::default()))).await.unwrap();
        assert_eq!(third.width(), 2);
    }

    #[tokio::test]
    async fn panicking_grab_is_a_backend_error() {
        let mut grab = BlockingGrab::new();
        let err = grab.run(|| panic!("driver crashed")).await.unwrap_err();
        assert!(matches!(err, CaptureError::Backend(msg) if msg.starts_with("capture task failed")));
        assert!(!grab.is_busy());
    }
}
