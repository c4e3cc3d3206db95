//! Connection drawing and the cardinality decision behind it.
//!
//! The renderer never writes business objects. When a redraw implies a data
//! change (clearing cardinality on attribute links, filling in defaults on
//! entity links) it is reported as a [`CardinalityPatch`] and the modeling
//! layer applies it.

use er_core::{
    Cardinality, Element, ElementGraph, ErType, MarkerStyle, Point, Property, PropertyValue,
};
use er_layout::{
    Endpoint, LabelPlacement, MarkerPrimitive, cardinality_marker, endpoint_point, line_direction,
    path_length, place_cardinality_label,
};
use tracing::debug;

use crate::scene::{DrawCommand, DrawList, Layer, Paint, Primitive};
use crate::shape::{ConnectionRender, RenderSettings};
use crate::style::contrast_color;

const CONNECTOR_WIDTH: f64 = 1.5;
const PARENT_CHILD_WIDTH: f64 = 1.0;
const PARENT_CHILD_DASH: &str = "4,4";
const MARKER_WIDTH: f64 = 1.5;
const MARKER_FILL: &str = "#FFFFFF";

/// Which decoration a connection gets, decided from its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDecision {
    /// Container to child link. Never decorated.
    ParentChild,
    /// An attribute-like endpoint. Cardinality is cleared.
    AttributeInvolved,
    EntityToEntity,
    /// Only the source end is decorated, from stored values.
    SourceOnly,
    Plain,
}

/// Data change implied by a connection redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityPatch {
    Clear,
    /// Defaults for endpoints that had no value. `None` leaves the side alone.
    AssignDefaults {
        source: Option<Cardinality>,
        target: Option<Cardinality>,
    },
}

impl CardinalityPatch {
    /// Property writes that realize the patch.
    #[must_use]
    pub fn writes(&self) -> Vec<(Property, PropertyValue)> {
        match *self {
            Self::Clear => vec![
                (Property::CardinalitySource, PropertyValue::Null),
                (Property::CardinalityTarget, PropertyValue::Null),
                (Property::Cardinality, PropertyValue::Null),
            ],
            Self::AssignDefaults { source, target } => {
                let mut writes = Vec::with_capacity(2);
                if let Some(value) = source {
                    writes.push((Property::CardinalitySource, PropertyValue::from(value.as_str())));
                }
                if let Some(value) = target {
                    writes.push((Property::CardinalityTarget, PropertyValue::from(value.as_str())));
                }
                writes
            }
        }
    }
}

fn has_cardinality(connection: &Element) -> bool {
    let bo = &connection.business_object;
    [
        Property::CardinalitySource,
        Property::CardinalityTarget,
        Property::Cardinality,
    ]
    .iter()
    .any(|property| bo.text(property).is_some())
}

fn endpoint_types(connection: &Element, graph: &ElementGraph) -> Option<(ErType, ErType)> {
    let data = connection.connection.as_ref()?;
    let source = graph.get(&data.source)?.er_type()?;
    let target = graph.get(&data.target)?.er_type()?;
    Some((source, target))
}

#[must_use]
pub fn classify_connection(connection: &Element, graph: &ElementGraph) -> ConnectionDecision {
    if connection.is_parent_child() {
        return ConnectionDecision::ParentChild;
    }
    match endpoint_types(connection, graph) {
        Some((source, target)) if source.is_attribute_like() || target.is_attribute_like() => {
            ConnectionDecision::AttributeInvolved
        }
        Some((ErType::Entity, ErType::Entity)) => ConnectionDecision::EntityToEntity,
        _ if has_cardinality(connection) => ConnectionDecision::SourceOnly,
        _ => ConnectionDecision::Plain,
    }
}

/// Value drawn at the source end when only one side is decorated.
fn source_only_value(connection: &Element) -> Option<&str> {
    let bo = &connection.business_object;
    bo.text(&Property::CardinalitySource)
        .or_else(|| bo.text(&Property::Cardinality))
        .or_else(|| bo.text(&Property::CardinalityTarget))
}

pub(crate) fn draw_er_connection(
    settings: &RenderSettings,
    connection: &Element,
    graph: &ElementGraph,
) -> ConnectionRender {
    let waypoints = connection.waypoints();
    let decision = classify_connection(connection, graph);
    let mut commands = Vec::new();
    if waypoints.len() >= 2 {
        commands.push(connector(settings, decision, waypoints));
    } else {
        debug!(id = %connection.id, points = waypoints.len(), "connection without a drawable path");
    }

    let palette_stroke = &settings.palette.connection;
    let mut patch = None;
    match decision {
        // Containment links stay out of cardinality handling entirely.
        ConnectionDecision::ParentChild | ConnectionDecision::Plain => {}
        ConnectionDecision::AttributeInvolved => {
            if has_cardinality(connection) {
                patch = Some(CardinalityPatch::Clear);
            }
        }
        ConnectionDecision::EntityToEntity => {
            let bo = &connection.business_object;
            let (default_source, default_target) =
                settings.notation.default_pair(ErType::Entity, ErType::Entity);
            let stored_source = bo.text(&Property::CardinalitySource);
            let stored_target = bo.text(&Property::CardinalityTarget);
            if stored_source.is_none() || stored_target.is_none() {
                patch = Some(CardinalityPatch::AssignDefaults {
                    source: stored_source.is_none().then_some(default_source),
                    target: stored_target.is_none().then_some(default_target),
                });
            }
            let source = stored_source.unwrap_or(default_source.as_str());
            let target = stored_target.unwrap_or(default_target.as_str());
            for (end, value) in [(Endpoint::Source, source), (Endpoint::Target, target)] {
                commands.extend(decorate_end(
                    settings,
                    waypoints,
                    end,
                    value,
                    LabelPlacement::EntityToEntity,
                    palette_stroke,
                ));
            }
        }
        ConnectionDecision::SourceOnly => {
            if let Some(value) = source_only_value(connection) {
                let placement = LabelPlacement::Proportional {
                    connection_length: path_length(waypoints),
                };
                commands.extend(decorate_end(
                    settings,
                    waypoints,
                    Endpoint::Source,
                    value,
                    placement,
                    palette_stroke,
                ));
            }
        }
    }

    ConnectionRender {
        draw_list: DrawList::new(connection.id.clone(), commands),
        patch,
    }
}

fn connector(
    settings: &RenderSettings,
    decision: ConnectionDecision,
    waypoints: &[Point],
) -> DrawCommand {
    let paint = if decision == ConnectionDecision::ParentChild {
        Paint::stroked(&settings.palette.parent_child, PARENT_CHILD_WIDTH).dashed(PARENT_CHILD_DASH)
    } else {
        Paint::stroked(&settings.palette.connection, CONNECTOR_WIDTH)
    };
    DrawCommand::new(
        Layer::Connector,
        Primitive::Polyline {
            points: waypoints.to_vec(),
        },
        paint,
    )
}

fn decorate_end(
    settings: &RenderSettings,
    waypoints: &[Point],
    end: Endpoint,
    value: &str,
    placement: LabelPlacement,
    stroke: &str,
) -> Vec<DrawCommand> {
    let Some(point) = endpoint_point(waypoints, end) else {
        return Vec::new();
    };
    let direction = line_direction(waypoints, end);
    match settings.notation.marker_style() {
        MarkerStyle::Label => {
            let text = settings
                .notation
                .format_cardinality_display(value, settings.locale);
            let position = place_cardinality_label(point, direction, placement);
            vec![DrawCommand::new(
                Layer::Label,
                settings.label(position, vec![text], false),
                Paint::text(contrast_color(MARKER_FILL)),
            )]
        }
        MarkerStyle::Symbols => cardinality_marker(point, direction, value)
            .into_iter()
            .map(|primitive| match primitive {
                MarkerPrimitive::Line { from, to } => DrawCommand::new(
                    Layer::Marker,
                    Primitive::Line { from, to },
                    Paint::stroked(stroke, MARKER_WIDTH),
                ),
                MarkerPrimitive::Circle { center, radius } => DrawCommand::new(
                    Layer::Marker,
                    Primitive::Circle { center, radius },
                    Paint::filled(MARKER_FILL, stroke, MARKER_WIDTH),
                ),
            })
            .collect(),
    }
}
