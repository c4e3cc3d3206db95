use er_core::{CardinalityNotation, Multiplicity, Optionality, Point, normalize_cardinality};
use nalgebra::{Rotation2, Vector2};

use crate::geometry::{to_point, to_vector};

/// Half length of marker bars and crow's-foot prong spread, perpendicular to the line.
pub const MARKER_HALF_WIDTH: f64 = 8.0;
pub const MARKER_CIRCLE_RADIUS: f64 = 6.0;

const MANDATORY_ONE_BAR: f64 = 18.0;
const OPTIONAL_ONE_BAR: f64 = 12.0;
const OPTIONAL_ONE_CIRCLE: f64 = 24.0;
const FOOT_CONVERGENCE: f64 = 18.0;
const MANDATORY_MANY_BAR: f64 = 24.0;
const OPTIONAL_MANY_CIRCLE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerPrimitive {
    Line { from: Point, to: Point },
    Circle { center: Point, radius: f64 },
}

/// Maps marker-local coordinates (`along` the line, `across` it) to diagram space.
struct MarkerFrame {
    origin: Vector2<f64>,
    rotation: Rotation2<f64>,
}

impl MarkerFrame {
    fn new(endpoint: Point, direction: Vector2<f64>) -> Self {
        Self {
            origin: to_vector(endpoint),
            rotation: Rotation2::new(direction.y.atan2(direction.x)),
        }
    }

    fn at(&self, along: f64, across: f64) -> Point {
        to_point(self.origin + self.rotation * Vector2::new(along, across))
    }

    fn bar(&self, along: f64) -> MarkerPrimitive {
        MarkerPrimitive::Line {
            from: self.at(along, -MARKER_HALF_WIDTH),
            to: self.at(along, MARKER_HALF_WIDTH),
        }
    }

    fn circle(&self, along: f64) -> MarkerPrimitive {
        MarkerPrimitive::Circle {
            center: self.at(along, 0.0),
            radius: MARKER_CIRCLE_RADIUS,
        }
    }

    fn foot(&self) -> [MarkerPrimitive; 3] {
        let tip = self.at(FOOT_CONVERGENCE, 0.0);
        [-MARKER_HALF_WIDTH, 0.0, MARKER_HALF_WIDTH].map(|across| MarkerPrimitive::Line {
            from: self.at(0.0, across),
            to: tip,
        })
    }
}

/// Symbol cluster for one connection end.
///
/// `direction` points from the endpoint along the line (see
/// [`crate::line_direction`]); every offset is measured along it.
#[must_use]
pub fn crows_foot_marker(
    endpoint: Point,
    direction: Vector2<f64>,
    notation: CardinalityNotation,
) -> Vec<MarkerPrimitive> {
    let frame = MarkerFrame::new(endpoint, direction);
    match (notation.optionality, notation.multiplicity) {
        (Optionality::Mandatory, Multiplicity::One) => vec![frame.bar(MANDATORY_ONE_BAR)],
        (Optionality::Optional, Multiplicity::One) => {
            vec![frame.bar(OPTIONAL_ONE_BAR), frame.circle(OPTIONAL_ONE_CIRCLE)]
        }
        (Optionality::Mandatory, Multiplicity::Many) => {
            let mut primitives = frame.foot().to_vec();
            primitives.push(frame.bar(MANDATORY_MANY_BAR));
            primitives
        }
        (Optionality::Optional, Multiplicity::Many) => {
            let mut primitives = frame.foot().to_vec();
            primitives.push(frame.circle(OPTIONAL_MANY_CIRCLE));
            primitives
        }
    }
}

/// Normalize free-text cardinality and build its symbol cluster.
#[must_use]
pub fn cardinality_marker(
    endpoint: Point,
    direction: Vector2<f64>,
    cardinality: &str,
) -> Vec<MarkerPrimitive> {
    crows_foot_marker(endpoint, direction, normalize_cardinality(cardinality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, line_direction};

    fn close(a: Point, b: Point) -> bool {
        a.distance_to(b) < 1e-9
    }

    #[test]
    fn mandatory_one_is_a_single_bar_at_18() {
        let markers = cardinality_marker(Point::new(0.0, 0.0), Vector2::x(), "1..1");
        assert_eq!(markers.len(), 1);
        let MarkerPrimitive::Line { from, to } = markers[0] else {
            panic!("expected a bar");
        };
        assert!(close(from, Point::new(18.0, -8.0)));
        assert!(close(to, Point::new(18.0, 8.0)));
    }

    #[test]
    fn target_crows_foot_points_back_along_the_line() {
        let waypoints = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let direction = line_direction(&waypoints, Endpoint::Target);
        let markers = cardinality_marker(waypoints[1], direction, "1..N");
        assert_eq!(markers.len(), 4);
        for prong in &markers[..3] {
            let MarkerPrimitive::Line { from, to } = *prong else {
                panic!("expected a prong");
            };
            assert!((from.x - 100.0).abs() < 1e-9);
            assert!(close(to, Point::new(82.0, 0.0)));
        }
        let MarkerPrimitive::Line { from, .. } = markers[3] else {
            panic!("expected the mandatory bar");
        };
        assert!((from.x - 76.0).abs() < 1e-9);
    }

    #[test]
    fn optional_variants_add_circles() {
        let one = cardinality_marker(Point::new(0.0, 0.0), Vector2::x(), "0..1");
        assert!(matches!(
            one[1],
            MarkerPrimitive::Circle { center, radius }
                if close(center, Point::new(24.0, 0.0)) && radius == MARKER_CIRCLE_RADIUS
        ));
        let many = cardinality_marker(Point::new(0.0, 0.0), Vector2::x(), "0..N");
        assert_eq!(many.len(), 4);
        assert!(matches!(
            many[3],
            MarkerPrimitive::Circle { center, .. } if close(center, Point::new(30.0, 0.0))
        ));
    }

    #[test]
    fn vertical_lines_rotate_the_cluster() {
        let markers = cardinality_marker(Point::new(10.0, 10.0), Vector2::new(0.0, 1.0), "1..1");
        let MarkerPrimitive::Line { from, to } = markers[0] else {
            panic!("expected a bar");
        };
        assert!((from.y - 28.0).abs() < 1e-9);
        assert!((to.y - 28.0).abs() < 1e-9);
        assert!((from.x - to.x).abs() > 15.0);
    }
}
