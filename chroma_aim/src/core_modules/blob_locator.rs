// THEORY:
// The `BlobLocator` is the spatial grouping stage. Where the color mask answers
// "which pixels match?", the locator answers "where is the thing that matches?"
// It does this with plain binary connected-component analysis over the mask.
//
// Key decisions:
// 1.  **8-Connectivity**: Two matching pixels belong to the same blob if they
//     touch along an edge *or* a corner. This is the grouping an external
//     contour trace produces, so thin diagonal strokes stay one object.
// 2.  **Scan-Order Seeding**: Seeds are taken in row-major order. The first
//     unvisited matching pixel starts a new blob, so blob ids follow the order
//     in which each blob's top-most, left-most pixel is met.
// 3.  **Largest Wins, First Found Breaks Ties**: Only the largest blob by pixel
//     count matters to the tracking loop. Among equally large blobs the one
//     seeded first wins. This is deterministic, not a judgement of which blob
//     is "best".
// 4.  **Center of Mass**: The centroid is the mean of the blob's pixel
//     coordinates (first moment over area), not the center of its bounding box.
// 5.  **Stateless Utility**: Nothing is remembered between calls.

use crate::core_modules::frame::Mask;

/// A pixel coordinate inside a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// The integer center of mass of a blob, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

/// One connected region of matching pixels.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Scan-order index of this blob within the mask it came from.
    pub id: u64,
    /// Every pixel of the region, in the order the flood fill visited them.
    pub pixels: Vec<Point>,
    /// The top-left and bottom-right corners enclosing the region.
    pub bounding_box: (Point, Point),
    /// Sum of x and y over all pixels; the first moments of the region.
    moment_sum: (u64, u64),
}

impl Blob {
    /// Number of pixels in the region.
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    pub fn centroid(&self) -> Option<Centroid> {
        let area = self.area() as u64;
        if area == 0 {
            return None;
        }
        Some(Centroid {
            x: (self.moment_sum.0 / area) as i32,
            y: (self.moment_sum.1 / area) as i32,
        })
    }
}

pub mod blob_locator {
    use super::*;

    const NEIGHBORS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];

    /// Finds every 8-connected region of `true` pixels, in scan order of their seeds.
    pub fn find_blobs(mask: &Mask) -> Vec<Blob> {
        let mut visited = vec![false; mask.bits.len()];
        let mut blobs: Vec<Blob> = Vec::new();
        let mut blob_id_counter = 0;

        for y in 0..mask.height {
            for x in 0..mask.width {
                let index = y * mask.width + x;
                if !mask.bits[index] || visited[index] {
                    continue;
                }
                let seed = Point {
                    x: x as u32,
                    y: y as u32,
                };
                blobs.push(grow_blob(seed, mask, &mut visited, blob_id_counter));
                blob_id_counter += 1;
            }
        }

        blobs
    }

    /// Returns the centroid of the largest blob, or `None` for an empty mask.
    pub fn largest_blob_centroid(mask: &Mask) -> Option<Centroid> {
        largest_blob(mask).and_then(|blob| blob.centroid())
    }

    /// Returns the largest blob; ties go to the blob found first.
    pub fn largest_blob(mask: &Mask) -> Option<Blob> {
        let mut best: Option<Blob> = None;
        for blob in find_blobs(mask) {
            if best.as_ref().is_none_or(|current| blob.area() > current.area()) {
                best = Some(blob);
            }
        }
        best
    }

    /// Flood-fills one region starting at `seed` with an explicit stack.
    fn grow_blob(seed: Point, mask: &Mask, visited: &mut [bool], blob_id: u64) -> Blob {
        let width = mask.width as i64;
        let height = mask.height as i64;

        let mut pixels: Vec<Point> = Vec::new();
        let mut stack: Vec<Point> = vec![seed];
        visited[seed.y as usize * mask.width + seed.x as usize] = true;

        while let Some(current) = stack.pop() {
            pixels.push(current);

            for (dx, dy) in NEIGHBORS {
                let nx = current.x as i64 + dx;
                let ny = current.y as i64 + dy;
                if nx < 0 || nx >= width || ny < 0 || ny >= height {
                    continue;
                }
                let index = ny as usize * mask.width + nx as usize;
                if mask.bits[index] && !visited[index] {
                    visited[index] = true;
                    stack.push(Point {
                        x: nx as u32,
                        y: ny as u32,
                    });
                }
            }
        }

        // --- Aggregation ---
        let mut min = Point {
            x: u32::MAX,
            y: u32::MAX,
        };
        let mut max = Point { x: 0, y: 0 };
        let mut sum_x = 0u64;
        let mut sum_y = 0u64;
        for point in &pixels {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
            sum_x += point.x as u64;
            sum_y += point.y as u64;
        }

        Blob {
            id: blob_id,
            pixels,
            bounding_box: (min, max),
            moment_sum: (sum_x, sum_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::blob_locator::*;
    use super::*;

    fn mask_from(rows: &[&str]) -> Mask {
        let mut mask = Mask::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                mask.set(x, y, c == '#');
            }
        }
        mask
    }

    #[test]
    fn empty_mask_has_no_centroid() {
        assert_eq!(largest_blob_centroid(&Mask::new(0, 0)), None);
        assert_eq!(largest_blob_centroid(&Mask::new(40, 30)), None);
    }

    #[test]
    fn single_pixel_is_its_own_centroid() {
        let mut mask = Mask::new(20, 10);
        mask.set(13, 7, true);
        assert_eq!(largest_blob_centroid(&mask), Some(Centroid { x: 13, y: 7 }));
    }

    #[test]
    fn diagonal_pixels_form_one_blob() {
        let mask = mask_from(&["#...", ".#..", "..#.", "...#"]);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area(), 4);
        assert_eq!(blobs[0].centroid(), Some(Centroid { x: 1, y: 1 }));
    }

    #[test]
    fn picks_the_largest_blob() {
        let mask = mask_from(&[
            "##......", //
            "##......",
            "........",
            "....###.",
            "....###.",
            "....###.",
        ]);
        let blob = largest_blob(&mask).unwrap();
        assert_eq!(blob.area(), 9);
        assert_eq!(blob.id, 1);
        assert_eq!(
            blob.bounding_box,
            (Point { x: 4, y: 3 }, Point { x: 6, y: 5 })
        );
        assert_eq!(largest_blob_centroid(&mask), Some(Centroid { x: 5, y: 4 }));
    }

    #[test]
    fn equal_areas_keep_the_first_found() {
        let mask = mask_from(&["....##", "......", "##...."]);
        let blob = largest_blob(&mask).unwrap();
        assert_eq!(blob.id, 0);
        assert_eq!(blob.centroid(), Some(Centroid { x: 4, y: 0 }));
    }

    #[test]
    fn centroid_is_center_of_mass_not_bounding_box() {
        // An L shape: bounding box center is (1, 1), mass sits lower-left.
        let mask = mask_from(&["#..", "#..", "###"]);
        let blob = largest_blob(&mask).unwrap();
        assert_eq!(blob.area(), 5);
        // x = (0+0+0+1+2)/5 = 0.6 -> 0, y = (0+1+2+2+2)/5 = 1.4 -> 1
        assert_eq!(blob.centroid(), Some(Centroid { x: 0, y: 1 }));
    }

    #[test]
    fn sparse_mask_yields_many_single_blobs() {
        let mask = mask_from(&["#.#.#", ".....", "#.#.#"]);
        assert_eq!(find_blobs(&mask).len(), 6);
    }
}
