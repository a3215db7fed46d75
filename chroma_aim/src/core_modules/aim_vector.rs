// Converts a centroid offset from the screen center into a relative pointer move.
//
// No clamping is applied: a target far from the center produces a
// correspondingly large jump.

use crate::core_modules::blob_locator::Centroid;

/// A relative pointer movement for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Displacement {
    pub dx: i32,
    pub dy: i32,
}

impl Displacement {
    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Half of each display dimension, rounded down.
pub fn screen_center(width: u32, height: u32) -> (i32, i32) {
    ((width / 2) as i32, (height / 2) as i32)
}

pub fn compute_displacement(
    centroid: Centroid,
    screen_center: (i32, i32),
    sensitivity: f64,
) -> Displacement {
    let scale = |offset: i32| (offset as f64 * sensitivity).round() as i32;
    Displacement {
        dx: scale(centroid.x - screen_center.0),
        dy: scale(centroid.y - screen_center.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_target_does_not_move() {
        for sensitivity in [0.1, 0.5, 0.7, 1.0] {
            let d = compute_displacement(Centroid { x: 960, y: 540 }, (960, 540), sensitivity);
            assert!(d.is_zero());
        }
    }

    #[test]
    fn scales_offset_by_sensitivity() {
        let d = compute_displacement(Centroid { x: 110, y: 100 }, (100, 100), 0.5);
        assert_eq!(d, Displacement { dx: 5, dy: 0 });

        let d = compute_displacement(Centroid { x: 0, y: 0 }, (100, 50), 0.7);
        assert_eq!(d, Displacement { dx: -70, dy: -35 });
    }

    #[test]
    fn rounds_to_nearest() {
        let d = compute_displacement(Centroid { x: 103, y: 97 }, (100, 100), 0.5);
        // 1.5 rounds away from zero, -1.5 likewise.
        assert_eq!(d, Displacement { dx: 2, dy: -2 });
    }

    #[test]
    fn large_offsets_are_not_clamped() {
        let d = compute_displacement(Centroid { x: 3840, y: 0 }, (960, 540), 1.0);
        assert_eq!(d, Displacement { dx: 2880, dy: -540 });
    }

    #[test]
    fn center_rounds_down() {
        assert_eq!(screen_center(1921, 1081), (960, 540));
    }
}
