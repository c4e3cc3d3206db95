use er_core::{Bounds, Point};
use tracing::{debug, trace};

use crate::bounds::Size;

/// Clearance required between a placed shape and any obstacle.
pub const COLLISION_MARGIN: f64 = 10.0;
/// Offset from the start used when the search radius is exhausted.
pub const FALLBACK_OFFSET: f64 = 50.0;

/// Axis-aligned overlap test with `a` inflated by `margin`.
///
/// Touching edges do not count as overlap.
#[must_use]
pub fn rects_overlap(a: Bounds, b: Bounds, margin: f64) -> bool {
    let a = a.inflate(margin);
    !(a.right() <= b.x || b.right() <= a.x || a.bottom() <= b.y || b.bottom() <= a.y)
}

fn is_free(position: Point, size: Size, obstacles: &[Bounds]) -> bool {
    let candidate = Bounds::new(position.x, position.y, size.width, size.height);
    !obstacles
        .iter()
        .any(|obstacle| rects_overlap(candidate, *obstacle, COLLISION_MARGIN))
}

/// Find a top-left position near `start` where a shape of `size` fits.
///
/// Tries `start`, then rings of increasing radius (`step`, `2 * step`, ...
/// up to `search_radius`) with four axis-aligned and four diagonal candidates
/// each. Falls back to `start + (50, 50)` when every ring is blocked.
#[must_use]
pub fn find_free_position(
    start: Point,
    size: Size,
    obstacles: &[Bounds],
    search_radius: f64,
    step: f64,
) -> Point {
    if is_free(start, size, obstacles) {
        return start;
    }

    if step > 0.0 && search_radius >= step {
        let mut radius = step;
        while radius <= search_radius {
            let candidates = [
                (radius, 0.0),
                (-radius, 0.0),
                (0.0, radius),
                (0.0, -radius),
                (radius, radius),
                (-radius, radius),
                (radius, -radius),
                (-radius, -radius),
            ];
            trace!(radius, "free-position ring");
            if let Some(found) = candidates
                .iter()
                .map(|&(dx, dy)| start.translate(dx, dy))
                .find(|&candidate| is_free(candidate, size, obstacles))
            {
                return found;
            }
            radius += step;
        }
    }

    debug!(
        x = start.x,
        y = start.y,
        search_radius,
        "no free position within radius, using fallback offset"
    );
    start.translate(FALLBACK_OFFSET, FALLBACK_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn start_is_kept_when_free() {
        let found = find_free_position(
            Point::new(0.0, 0.0),
            Size::new(40.0, 30.0),
            &[Bounds::new(200.0, 200.0, 50.0, 50.0)],
            300.0,
            20.0,
        );
        assert_eq!(found, Point::new(0.0, 0.0));
    }

    #[test]
    fn margin_counts_as_collision() {
        let obstacle = Bounds::new(45.0, 0.0, 40.0, 40.0);
        let shape = Bounds::new(0.0, 0.0, 40.0, 40.0);
        assert!(rects_overlap(shape, obstacle, COLLISION_MARGIN));
        assert!(!rects_overlap(shape, obstacle, 0.0));
    }

    #[test]
    fn blocked_rings_are_skipped() {
        let obstacle = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let found = find_free_position(
            Point::new(0.0, 0.0),
            Size::new(40.0, 40.0),
            &[obstacle],
            300.0,
            20.0,
        );
        // Rings at 20 and 40 are blocked by the margin; +x comes first at 60.
        assert_eq!(found, Point::new(60.0, 0.0));
        assert!(!rects_overlap(
            Bounds::new(found.x, found.y, 40.0, 40.0),
            obstacle,
            COLLISION_MARGIN
        ));
    }

    #[test]
    fn exhausted_radius_falls_back() {
        let wall = Bounds::new(-1_000.0, -1_000.0, 2_000.0, 2_000.0);
        let found = find_free_position(
            Point::new(0.0, 0.0),
            Size::new(40.0, 40.0),
            &[wall],
            100.0,
            20.0,
        );
        assert_eq!(found, Point::new(50.0, 50.0));
    }

    #[test]
    fn non_positive_step_goes_straight_to_fallback() {
        let found = find_free_position(
            Point::new(0.0, 0.0),
            Size::new(10.0, 10.0),
            &[Bounds::new(0.0, 0.0, 10.0, 10.0)],
            100.0,
            0.0,
        );
        assert_eq!(found, Point::new(50.0, 50.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_found_positions_clear_every_obstacle(
            start_x in 0.0f64..200.0,
            start_y in 0.0f64..200.0,
            obstacles in proptest::collection::vec(
                (0.0f64..200.0, 0.0f64..200.0, 10.0f64..60.0, 10.0f64..60.0),
                1..4,
            ),
        ) {
            let obstacles: Vec<Bounds> = obstacles
                .into_iter()
                .map(|(x, y, w, h)| Bounds::new(x, y, w, h))
                .collect();
            let size = Size::new(40.0, 30.0);
            let found = find_free_position(
                Point::new(start_x, start_y),
                size,
                &obstacles,
                300.0,
                20.0,
            );
            let placed = Bounds::new(found.x, found.y, size.width, size.height);
            for obstacle in &obstacles {
                prop_assert!(!rects_overlap(placed, *obstacle, COLLISION_MARGIN));
            }
        }
    }
}
