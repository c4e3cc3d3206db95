#![forbid(unsafe_code)]

//! Geometry for ER connections and containers: endpoint direction vectors,
//! cardinality label placement, crow's-foot marker primitives, bounding boxes
//! and free-position search. Everything here is recomputed from the current
//! waypoints on each call.

mod bounds;
mod collision;
mod geometry;
mod markers;

pub use bounds::{Size, group_bounds, ideal_container_size};
pub use collision::{COLLISION_MARGIN, FALLBACK_OFFSET, find_free_position, rects_overlap};
pub use geometry::{
    Endpoint, LabelPlacement, endpoint_point, line_direction, path_length,
    place_cardinality_label,
};
pub use markers::{
    MARKER_CIRCLE_RADIUS, MARKER_HALF_WIDTH, MarkerPrimitive, cardinality_marker,
    crows_foot_marker,
};
