// THEORY:
// Relative pointer movement through `enigo`. A move with a duration hint is
// split into a few evenly paced steps. The pauses between steps are tokio
// sleeps, so a paced move yields the runtime instead of parking it.

use crate::devices::PointerDevice;
use crate::error::InputError;
use anyhow::anyhow;
use async_trait::async_trait;
use enigo::{Coordinate, Enigo, Mouse, Settings};
use std::time::Duration;

/// How many pieces a timed move is split into.
const TIMED_MOVE_STEPS: i32 = 4;

pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn new() -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("failed to open the input device: {e}"))?;
        Ok(Self { enigo })
    }
}

#[async_trait(?Send)]
impl PointerDevice for EnigoPointer {
    /// A non-zero `duration` spreads the move over a few evenly paced steps.
    async fn move_relative(&mut self, dx: i32, dy: i32, duration: Duration) -> Result<(), InputError> {
        let steps = if duration.is_zero() || (dx == 0 && dy == 0) {
            1
        } else {
            TIMED_MOVE_STEPS
        };
        let pause = duration / steps as u32;

        for (i, (sx, sy)) in split_move(dx, dy, steps).into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(pause).await;
            }
            if sx == 0 && sy == 0 {
                continue;
            }
            self.enigo
                .move_mouse(sx, sy, Coordinate::Rel)
                .map_err(|e| InputError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

/// Splits (dx, dy) into `steps` integer moves that sum exactly to (dx, dy).
fn split_move(dx: i32, dy: i32, steps: i32) -> Vec<(i32, i32)> {
    let steps = steps.max(1);
    let mut moved = (0, 0);
    (1..=steps)
        .map(|i| {
            let target = (dx * i / steps, dy * i / steps);
            let step = (target.0 - moved.0, target.1 - moved.1);
            moved = target;
            step
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sums_to_the_whole_move() {
        for (dx, dy) in [(25, 0), (-7, 13), (1, -1), (0, 0), (1001, -333)] {
            let steps = split_move(dx, dy, TIMED_MOVE_STEPS);
            assert_eq!(steps.len(), TIMED_MOVE_STEPS as usize);
            let total = steps.iter().fold((0, 0), |acc, s| (acc.0 + s.0, acc.1 + s.1));
            assert_eq!(total, (dx, dy));
        }
    }

    #[test]
    fn single_step_is_the_whole_move() {
        assert_eq!(split_move(10, -4, 1), vec![(10, -4)]);
        assert_eq!(split_move(10, -4, 0), vec![(10, -4)]);
    }
}
