use er_core::Point;
use nalgebra::Vector2;

/// Which end of a connection a computation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

/// How far from the endpoint a cardinality label sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPlacement {
    /// Fixed offset used when both ends are entities.
    EntityToEntity,
    /// Half of the total connection length.
    Proportional { connection_length: f64 },
}

const ENTITY_LABEL_ALONG: f64 = 30.0;
const ENTITY_LABEL_ACROSS: f64 = -15.0;
const PROPORTIONAL_LABEL_RATIO: f64 = 0.5;
const PROPORTIONAL_LABEL_ACROSS: f64 = -20.0;

pub(crate) fn to_vector(point: Point) -> Vector2<f64> {
    Vector2::new(point.x, point.y)
}

pub(crate) fn to_point(vector: Vector2<f64>) -> Point {
    Point::new(vector.x, vector.y)
}

#[must_use]
pub fn endpoint_point(waypoints: &[Point], end: Endpoint) -> Option<Point> {
    match end {
        Endpoint::Source => waypoints.first().copied(),
        Endpoint::Target => waypoints.last().copied(),
    }
}

/// Unit vector from an endpoint along its adjacent segment.
///
/// The source uses the first segment, the target the last one reversed, so
/// both vectors point away from their element along the line. Degenerate
/// segments yield `(1, 0)`.
#[must_use]
pub fn line_direction(waypoints: &[Point], end: Endpoint) -> Vector2<f64> {
    let segment = match (end, waypoints) {
        (Endpoint::Source, [first, second, ..]) => Some((*first, *second)),
        (Endpoint::Target, [.., before, last]) => Some((*last, *before)),
        _ => None,
    };
    let Some((from, to)) = segment else {
        return Vector2::x();
    };
    let delta = to_vector(to) - to_vector(from);
    delta.try_normalize(f64::EPSILON).unwrap_or_else(Vector2::x)
}

#[must_use]
pub fn path_length(waypoints: &[Point]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

/// Position of a cardinality label next to an endpoint.
#[must_use]
pub fn place_cardinality_label(
    point: Point,
    direction: Vector2<f64>,
    placement: LabelPlacement,
) -> Point {
    let (along, across) = match placement {
        LabelPlacement::EntityToEntity => (ENTITY_LABEL_ALONG, ENTITY_LABEL_ACROSS),
        LabelPlacement::Proportional { connection_length } => (
            connection_length * PROPORTIONAL_LABEL_RATIO,
            PROPORTIONAL_LABEL_ACROSS,
        ),
    };
    let normal = Vector2::new(-direction.y, direction.x);
    to_point(to_vector(point) + direction * along + normal * across)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn target_direction_is_reversed() {
        let points = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let source = line_direction(&points, Endpoint::Source);
        let target = line_direction(&points, Endpoint::Target);
        assert!(approx(source.x, 1.0) && approx(source.y, 0.0));
        assert!(approx(target.x, -1.0) && approx(target.y, 0.0));
    }

    #[test]
    fn bent_connection_uses_adjacent_segment() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(100.0, 50.0),
        ];
        let source = line_direction(&points, Endpoint::Source);
        let target = line_direction(&points, Endpoint::Target);
        assert!(approx(source.x, 0.0) && approx(source.y, 1.0));
        assert!(approx(target.x, -1.0) && approx(target.y, 0.0));
    }

    #[test]
    fn degenerate_segments_default_to_x_axis() {
        let same = [Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
        assert_eq!(line_direction(&same, Endpoint::Source), Vector2::x());
        assert_eq!(line_direction(&same[..1], Endpoint::Target), Vector2::x());
        assert_eq!(line_direction(&[], Endpoint::Source), Vector2::x());
    }

    #[test]
    fn entity_labels_use_fixed_offsets() {
        let label = place_cardinality_label(
            Point::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            LabelPlacement::EntityToEntity,
        );
        assert!(approx(label.x, 30.0));
        assert!(approx(label.y, -15.0));
    }

    #[test]
    fn other_labels_scale_with_length() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(60.0, 80.0),
        ];
        let length = path_length(&points);
        assert!(approx(length, 140.0));
        let label = place_cardinality_label(
            points[0],
            line_direction(&points, Endpoint::Source),
            LabelPlacement::Proportional {
                connection_length: length,
            },
        );
        assert!(approx(label.x, 70.0));
        assert!(approx(label.y, -20.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_direction_is_unit_length(
            x0 in -500.0f64..500.0,
            y0 in -500.0f64..500.0,
            x1 in -500.0f64..500.0,
            y1 in -500.0f64..500.0,
        ) {
            let points = [Point::new(x0, y0), Point::new(x1, y1)];
            for end in [Endpoint::Source, Endpoint::Target] {
                let direction = line_direction(&points, end);
                prop_assert!((direction.norm() - 1.0).abs() < 1e-6);
            }
            let source = line_direction(&points, Endpoint::Source);
            let target = line_direction(&points, Endpoint::Target);
            if (x1 - x0).hypot(y1 - y0) > 1e-6 {
                prop_assert!((source + target).norm() < 1e-6);
            }
        }
    }
}
