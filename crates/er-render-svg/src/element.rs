//! Retained SVG nodes.
//!
//! [`SvgSurface`](crate::SvgSurface) keeps a flat list of these per element
//! and the exporter nests them in groups.

use er_core::{Bounds, Point};

use crate::xml::{Attributes, escape_xml, fmt_num};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Path,
    Text,
    Tspan,
    Group,
    Marker,
    Defs,
}

impl ElementKind {
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
            Self::Path => "path",
            Self::Text => "text",
            Self::Tspan => "tspan",
            Self::Group => "g",
            Self::Marker => "marker",
            Self::Defs => "defs",
        }
    }

    /// Geometry nodes, which never carry text.
    #[must_use]
    pub const fn is_geometry(self) -> bool {
        !matches!(
            self,
            Self::Text | Self::Tspan | Self::Group | Self::Marker | Self::Defs
        )
    }

    /// Nodes a redraw replaces: geometry and labels, not structure.
    #[must_use]
    pub const fn is_visual(self) -> bool {
        self.is_geometry() || matches!(self, Self::Text)
    }

    #[must_use]
    pub fn node(self) -> SvgElement {
        SvgElement {
            kind: self,
            attrs: Attributes::new(),
            children: Vec::new(),
            text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgElement {
    kind: ElementKind,
    attrs: Attributes,
    children: Vec<SvgElement>,
    text: Option<String>,
}

impl SvgElement {
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.set(name, value);
        self
    }

    #[must_use]
    pub fn num(mut self, name: &str, value: f64) -> Self {
        self.attrs.set_num(name, value);
        self
    }

    #[must_use]
    pub fn at(self, point: Point) -> Self {
        self.num("x", point.x).num("y", point.y)
    }

    /// `x`, `y`, `width` and `height` of a rect.
    #[must_use]
    pub fn frame(self, bounds: Bounds) -> Self {
        self.at(Point::new(bounds.x, bounds.y))
            .num("width", bounds.width)
            .num("height", bounds.height)
    }

    #[must_use]
    pub fn center(self, center: Point) -> Self {
        self.num("cx", center.x).num("cy", center.y)
    }

    #[must_use]
    pub fn radii(self, rx: f64, ry: f64) -> Self {
        self.num("rx", rx).num("ry", ry)
    }

    #[must_use]
    pub fn endpoints(self, from: Point, to: Point) -> Self {
        self.num("x1", from.x)
            .num("y1", from.y)
            .num("x2", to.x)
            .num("y2", to.y)
    }

    #[must_use]
    pub fn points(self, points: &[Point]) -> Self {
        let value = points
            .iter()
            .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
            .collect::<Vec<_>>()
            .join(" ");
        self.attr("points", &value)
    }

    #[must_use]
    pub fn fill(self, color: &str) -> Self {
        self.attr("fill", color)
    }

    #[must_use]
    pub fn stroke(self, color: &str, width: f64) -> Self {
        self.attr("stroke", color).num("stroke-width", width)
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.attrs.add_class(class);
        self
    }

    /// `data-*` attribute.
    #[must_use]
    pub fn data(self, name: &str, value: &str) -> Self {
        self.attr(&format!("data-{name}"), value)
    }

    #[must_use]
    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn child(mut self, node: SvgElement) -> Self {
        self.children.push(node);
        self
    }

    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = SvgElement>) -> Self {
        self.children.extend(nodes);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    #[must_use]
    pub const fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    pub fn child_nodes_mut(&mut self) -> &mut Vec<SvgElement> {
        &mut self.children
    }

    /// Own text followed by each child's, one line per node.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.text
            .iter()
            .map(String::as_str)
            .chain(self.children.iter().filter_map(|c| c.text.as_deref()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(128);
        self.write_into(&mut out);
        out
    }

    pub fn write_into(&self, out: &mut String) {
        let tag = self.kind.tag_name();
        out.push('<');
        out.push_str(tag);
        self.attrs.write_into(out);
        if self.children.is_empty() && self.text.is_none() && self.kind.is_geometry() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_xml(text, false));
        }
        for child in &self.children {
            child.write_into(out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_frame_serializes_in_order() {
        let svg = ElementKind::Rect
            .node()
            .frame(Bounds::new(10.0, 20.0, 100.0, 50.0))
            .radii(8.0, 8.0)
            .fill("#E3F2FD")
            .render();
        assert_eq!(
            svg,
            r##"<rect x="10" y="20" width="100" height="50" rx="8" ry="8" fill="#E3F2FD"/>"##
        );
    }

    #[test]
    fn diamond_points_are_space_separated() {
        let svg = ElementKind::Polygon
            .node()
            .points(&[
                Point::new(50.0, 0.0),
                Point::new(100.0, 25.0),
                Point::new(50.0, 50.0),
                Point::new(0.0, 25.0),
            ])
            .render();
        assert!(svg.contains(r#"points="50,0 100,25 50,50 0,25""#));
    }

    #[test]
    fn multi_line_labels_escape_and_join() {
        let label = ElementKind::Text
            .node()
            .child(ElementKind::Tspan.node().content("Cliente & Pedido"))
            .child(ElementKind::Tspan.node().content("<PK>"));
        let svg = label.render();
        assert!(svg.contains("Cliente &amp; Pedido"));
        assert!(svg.contains("&lt;PK&gt;"));
        assert_eq!(label.full_text(), "Cliente & Pedido\n<PK>");
    }

    #[test]
    fn empty_group_still_closes() {
        assert_eq!(ElementKind::Group.node().render(), "<g></g>");
        assert!(ElementKind::Ellipse.is_visual());
        assert!(ElementKind::Text.is_visual());
        assert!(!ElementKind::Marker.is_visual());
        assert!(!ElementKind::Defs.is_visual());
    }
}
