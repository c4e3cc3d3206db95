//! Immutable draw-command lists produced by the renderers.
//!
//! A renderer never touches a surface directly; it returns a [`DrawList`]
//! and an adapter (SVG, canvas) applies it. Every command carries a
//! [`Layer`] so a partial redraw can replace only what a property affects.

use er_core::{Bounds, ElementId, Point, Property};
use er_layout::group_bounds;

use crate::element::{ElementKind, SvgElement};
use crate::text::TextAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Outline,
    InnerOutline,
    Label,
    Connector,
    Marker,
}

impl Layer {
    pub const ALL: [Self; 5] = [
        Self::Outline,
        Self::InnerOutline,
        Self::Label,
        Self::Connector,
        Self::Marker,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::InnerOutline => "inner-outline",
            Self::Label => "label",
            Self::Connector => "connector",
            Self::Marker => "marker",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.as_str() == value)
    }
}

/// Layers whose output depends on `property`.
#[must_use]
pub fn layers_for_property(property: &Property) -> &'static [Layer] {
    match property {
        Property::IsRequired => &[Layer::Label],
        Property::IsPrimaryKey => &[Layer::Outline, Layer::InnerOutline, Layer::Label],
        Property::IsDerived
        | Property::IsMultivalued
        | Property::IsComposite
        | Property::IsSubAttribute => &[Layer::Outline, Layer::InnerOutline],
        Property::CardinalitySource | Property::CardinalityTarget | Property::Cardinality => {
            &[Layer::Marker, Layer::Label]
        }
        Property::Other(_) => &[Layer::Outline, Layer::InnerOutline, Layer::Label],
        _ => &Layer::ALL,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub dash: Option<&'static str>,
}

impl Paint {
    #[must_use]
    pub fn filled(fill: &str, stroke: &str, stroke_width: f64) -> Self {
        Self {
            fill: Some(fill.to_string()),
            stroke: Some(stroke.to_string()),
            stroke_width,
            dash: None,
        }
    }

    #[must_use]
    pub fn stroked(stroke: &str, stroke_width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke.to_string()),
            stroke_width,
            dash: None,
        }
    }

    #[must_use]
    pub fn text(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            stroke: None,
            stroke_width: 0.0,
            dash: None,
        }
    }

    #[must_use]
    pub fn dashed(mut self, pattern: &'static str) -> Self {
        self.dash = Some(pattern);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    /// Center of the text block.
    pub position: Point,
    pub lines: Vec<String>,
    pub font_size: f64,
    pub line_height: f64,
    pub anchor: TextAnchor,
    pub underline: bool,
}

impl TextLabel {
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Baseline of the first line so the block is vertically centered.
    #[must_use]
    pub fn first_line_y(&self) -> f64 {
        let extra_lines = self.lines.len().saturating_sub(1) as f64;
        self.position.y - extra_lines * self.line_height / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect { bounds: Bounds, radius: f64 },
    Ellipse { center: Point, rx: f64, ry: f64 },
    Polygon { points: Vec<Point> },
    Polyline { points: Vec<Point> },
    Line { from: Point, to: Point },
    Circle { center: Point, radius: f64 },
    Text(TextLabel),
}

impl Primitive {
    /// Geometric extent; text uses its anchor point only.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let span = |points: &[Point]| {
            let rects: Vec<Bounds> = points
                .iter()
                .map(|p| Bounds::new(p.x, p.y, 0.0, 0.0))
                .collect();
            group_bounds(&rects).unwrap_or_default()
        };
        match self {
            Self::Rect { bounds, .. } => *bounds,
            Self::Ellipse { center, rx, ry } => {
                Bounds::new(center.x - rx, center.y - ry, rx * 2.0, ry * 2.0)
            }
            Self::Polygon { points } | Self::Polyline { points } => span(points),
            Self::Line { from, to } => span(&[*from, *to]),
            Self::Circle { center, radius } => Bounds::new(
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
            ),
            Self::Text(label) => Bounds::new(label.position.x, label.position.y, 0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub layer: Layer,
    pub primitive: Primitive,
    pub paint: Paint,
    pub marker_start: Option<String>,
    pub marker_end: Option<String>,
}

impl DrawCommand {
    #[must_use]
    pub fn new(layer: Layer, primitive: Primitive, paint: Paint) -> Self {
        Self {
            layer,
            primitive,
            paint,
            marker_start: None,
            marker_end: None,
        }
    }

    #[must_use]
    pub fn with_marker_end(mut self, marker: &str) -> Self {
        self.marker_end = Some(marker.to_string());
        self
    }

    #[must_use]
    pub fn has_arrow_markers(&self) -> bool {
        self.marker_start.is_some() || self.marker_end.is_some()
    }

    #[must_use]
    pub fn to_svg(&self) -> SvgElement {
        let node = match &self.primitive {
            Primitive::Rect { bounds, radius } if *radius > 0.0 => {
                ElementKind::Rect.node().frame(*bounds).radii(*radius, *radius)
            }
            Primitive::Rect { bounds, .. } => ElementKind::Rect.node().frame(*bounds),
            Primitive::Ellipse { center, rx, ry } => {
                ElementKind::Ellipse.node().center(*center).radii(*rx, *ry)
            }
            Primitive::Polygon { points } => ElementKind::Polygon.node().points(points),
            Primitive::Polyline { points } => ElementKind::Polyline.node().points(points),
            Primitive::Line { from, to } => ElementKind::Line.node().endpoints(*from, *to),
            Primitive::Circle { center, radius } => {
                ElementKind::Circle.node().center(*center).num("r", *radius)
            }
            Primitive::Text(label) => text_element(label),
        };

        let mut node = node
            .class(&format!("er-{}", self.layer.as_str()))
            .data("layer", self.layer.as_str());
        let is_text = matches!(self.primitive, Primitive::Text(_));
        match self.paint.fill.as_deref() {
            Some(fill) => node = node.fill(fill),
            None if !is_text => node = node.fill("none"),
            None => {}
        }
        if let Some(stroke) = &self.paint.stroke {
            node = node.stroke(stroke, self.paint.stroke_width);
        }
        let markers = [
            ("stroke-dasharray", self.paint.dash),
            ("marker-start", self.marker_start.as_deref()),
            ("marker-end", self.marker_end.as_deref()),
        ];
        for (name, value) in markers {
            if let Some(value) = value {
                node = node.attr(name, value);
            }
        }
        node
    }
}

fn text_element(label: &TextLabel) -> SvgElement {
    let mut node = ElementKind::Text
        .node()
        .at(Point::new(label.position.x, label.first_line_y()))
        .attr("text-anchor", label.anchor.as_str())
        .attr("dominant-baseline", "middle")
        .num("font-size", label.font_size);
    if label.underline {
        node = node.attr("text-decoration", "underline");
    }
    if let [single] = label.lines.as_slice() {
        return node.content(single.as_str());
    }
    let lines = label.lines.iter().enumerate().map(|(i, line)| {
        ElementKind::Tspan
            .node()
            .num("x", label.position.x)
            .num("dy", if i == 0 { 0.0 } else { label.line_height })
            .content(line.as_str())
    });
    node.children(lines)
}

/// Fresh output of one render pass for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    element: ElementId,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    #[must_use]
    pub fn new(element: ElementId, commands: Vec<DrawCommand>) -> Self {
        Self { element, commands }
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn in_layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(move |c| c.layer == layer)
    }

    #[must_use]
    pub fn has_layer(&self, layer: Layer) -> bool {
        self.in_layer(layer).next().is_some()
    }

    /// Label texts in draw order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match &c.primitive {
                Primitive::Text(label) => Some(label.text()),
                _ => None,
            })
            .collect()
    }

    /// Copy restricted to `layers`.
    #[must_use]
    pub fn filter_layers(&self, layers: &[Layer]) -> Self {
        Self::new(
            self.element.clone(),
            self.commands
                .iter()
                .filter(|c| layers.contains(&c.layer))
                .cloned()
                .collect(),
        )
    }

    /// Copy with every `marker-start`/`marker-end` reference dropped.
    #[must_use]
    pub fn without_arrow_markers(mut self) -> Self {
        for command in &mut self.commands {
            command.marker_start = None;
            command.marker_end = None;
        }
        self
    }

    #[must_use]
    pub fn has_arrow_markers(&self) -> bool {
        self.commands.iter().any(DrawCommand::has_arrow_markers)
    }

    #[must_use]
    pub fn extent(&self) -> Option<Bounds> {
        let rects: Vec<Bounds> = self.commands.iter().map(|c| c.primitive.bounds()).collect();
        group_bounds(&rects)
    }

    #[must_use]
    pub fn to_svg_elements(&self) -> Vec<SvgElement> {
        self.commands.iter().map(DrawCommand::to_svg).collect()
    }

    /// Group wrapping every command, tagged with the element id.
    #[must_use]
    pub fn to_group(&self) -> SvgElement {
        ElementKind::Group
            .node()
            .class("er-element")
            .data("element-id", self.element.as_str())
            .children(self.to_svg_elements())
    }
}
