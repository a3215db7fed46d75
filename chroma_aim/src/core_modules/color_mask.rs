// THEORY:
// The color mask is the first analytical stage of a tick. It reduces a full
// color frame to a single question per pixel: "is this close enough to the
// target color?" Closeness is the L1 distance over the three channels, so the
// threshold is directly comparable to a sum of channel differences (0..=765).
//
// The stage is a pure function. It holds no state between ticks and has no
// side effects, which is what allows the tracking loop to treat a failed tick
// as disposable.

use crate::core_modules::color::{Color, MAX_DISTANCE};
use crate::core_modules::frame::{Frame, Mask};

/// Marks every pixel whose L1 distance to `target` is strictly below `threshold`.
///
/// A threshold of zero or less matches nothing. A threshold of `MAX_DISTANCE`
/// or more matches everything, including pixels exactly `MAX_DISTANCE` away.
pub fn compute_mask(frame: &Frame, target: Color, threshold: i32) -> Mask {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    if threshold <= 0 {
        return Mask::new(width, height);
    }
    if threshold as u32 >= MAX_DISTANCE {
        return Mask {
            width,
            height,
            bits: vec![true; width * height],
        };
    }

    let limit = threshold as u32;
    let bits = frame
        .pixels()
        .map(|pixel| pixel.l1_distance(&target) < limit)
        .collect();

    Mask { width, height, bits }
}
