//! Retained surfaces that draw lists are applied to.

use er_core::Point;
use tracing::trace;

use crate::element::{ElementKind, SvgElement};
use crate::scene::{DrawList, Layer};

/// Class names of host helper nodes that must survive a redraw.
pub const HOST_HELPER_CLASSES: [&str; 4] = [
    "djs-outline",
    "djs-hitbox",
    "djs-visual-hitbox",
    "djs-dragger",
];

const ARROW_MARKER_ATTRS: [&str; 2] = ["marker-start", "marker-end"];

/// A retained-mode target (SVG subtree, canvas, scene graph) for one element.
pub trait RenderSurface {
    /// Remove previously drawn visual primitives, keeping definitions,
    /// markers and host helper nodes.
    fn clear_visuals(&mut self);

    /// Remove only the primitives drawn into `layers`.
    fn clear_layers(&mut self, layers: &[Layer]);

    fn draw(&mut self, list: &DrawList);

    /// Drop arrow marker references from everything on the surface.
    /// Returns how many references were removed.
    fn strip_arrow_markers(&mut self) -> usize;

    /// Follow the element to `origin` in diagram coordinates. Surfaces that
    /// hold element-local nodes need nothing here.
    fn relocate(&mut self, _origin: Point) {}

    /// Replace the surface content with `list`, or only `layers` of it.
    fn apply(&mut self, list: &DrawList, layers: Option<&[Layer]>) {
        match layers {
            None => {
                self.clear_visuals();
                self.draw(list);
            }
            Some(layers) => {
                self.clear_layers(layers);
                self.draw(&list.filter_layers(layers));
            }
        }
    }
}

fn is_host_helper(node: &SvgElement) -> bool {
    HOST_HELPER_CLASSES
        .iter()
        .any(|class| node.attrs().has_class(class))
}

fn is_replaceable(node: &SvgElement) -> bool {
    node.kind().is_visual() && !is_host_helper(node)
}

fn node_layer(node: &SvgElement) -> Option<Layer> {
    node.attrs()
        .get("data-layer")
        .and_then(Layer::parse)
}

fn strip_markers(node: &mut SvgElement) -> usize {
    let mut removed = ARROW_MARKER_ATTRS
        .iter()
        .filter(|attr| node.attrs_mut().remove(attr))
        .count();
    for child in node.child_nodes_mut() {
        removed += strip_markers(child);
    }
    removed
}

/// SVG node list for one element's visual group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgSurface {
    nodes: Vec<SvgElement>,
}

impl SvgSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface already holding nodes created by the host (defs, outlines, a default shape).
    #[must_use]
    pub fn with_host_nodes(nodes: Vec<SvgElement>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[SvgElement] {
        &self.nodes
    }

    pub fn visual_nodes(&self) -> impl Iterator<Item = &SvgElement> {
        self.nodes.iter().filter(|node| is_replaceable(node))
    }

    pub fn nodes_in_layer(&self, layer: Layer) -> impl Iterator<Item = &SvgElement> {
        self.nodes
            .iter()
            .filter(move |node| node_layer(node) == Some(layer))
    }

    /// Text of every label node, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.kind() == ElementKind::Text)
            .map(SvgElement::full_text)
            .collect()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::new();
        for node in &self.nodes {
            node.write_into(&mut output);
        }
        output
    }
}

impl RenderSurface for SvgSurface {
    fn clear_visuals(&mut self) {
        let before = self.nodes.len();
        self.nodes.retain(|node| !is_replaceable(node));
        trace!(removed = before - self.nodes.len(), "svg.clear_visuals");
    }

    fn clear_layers(&mut self, layers: &[Layer]) {
        self.nodes.retain(|node| {
            !(is_replaceable(node) && node_layer(node).is_some_and(|layer| layers.contains(&layer)))
        });
    }

    fn draw(&mut self, list: &DrawList) {
        self.nodes.extend(list.to_svg_elements());
    }

    fn strip_arrow_markers(&mut self) -> usize {
        self.nodes.iter_mut().map(strip_markers).sum()
    }
}

#[cfg(test)]
mod tests {
    use er_core::{Bounds, ElementId};

    use super::*;
    use crate::scene::{DrawCommand, Paint, Primitive};

    fn outline_and_label() -> DrawList {
        DrawList::new(
            ElementId::new("A"),
            vec![
                DrawCommand::new(
                    Layer::Outline,
                    Primitive::Ellipse {
                        center: Point::new(40.0, 20.0),
                        rx: 40.0,
                        ry: 20.0,
                    },
                    Paint::filled("#F1F8E9", "#689F38", 2.0),
                ),
                DrawCommand::new(
                    Layer::InnerOutline,
                    Primitive::Ellipse {
                        center: Point::new(40.0, 20.0),
                        rx: 36.0,
                        ry: 16.0,
                    },
                    Paint::stroked("#689F38", 1.5),
                ),
            ],
        )
    }

    fn host_nodes() -> Vec<SvgElement> {
        vec![
            ElementKind::Defs
                .node()
                .child(ElementKind::Marker.node().attr("id", "arrow")),
            ElementKind::Rect
                .node()
                .class("djs-outline")
                .frame(Bounds::new(0.0, 0.0, 80.0, 40.0)),
            ElementKind::Rect
                .node()
                .frame(Bounds::new(0.0, 0.0, 80.0, 40.0))
                .fill("white"),
            ElementKind::Path
                .node()
                .attr("d", "M0 0 L10 0")
                .attr("marker-end", "url(#arrow)"),
        ]
    }

    #[test]
    fn clear_keeps_infrastructure() {
        let mut surface = SvgSurface::with_host_nodes(host_nodes());
        surface.clear_visuals();
        assert_eq!(surface.nodes().len(), 2);
        assert!(surface.nodes()[1].attrs().has_class("djs-outline"));
        assert_eq!(surface.visual_nodes().count(), 0);
    }

    #[test]
    fn apply_replaces_previous_drawing() {
        let mut surface = SvgSurface::with_host_nodes(host_nodes());
        surface.apply(&outline_and_label(), None);
        surface.apply(&outline_and_label(), None);
        assert_eq!(surface.visual_nodes().count(), 2);
        assert_eq!(surface.nodes().len(), 4);
    }

    #[test]
    fn partial_apply_touches_only_named_layers() {
        let mut surface = SvgSurface::new();
        surface.apply(&outline_and_label(), None);

        let without_inner = DrawList::new(
            ElementId::new("A"),
            outline_and_label().commands()[..1].to_vec(),
        );
        surface.apply(&without_inner, Some(&[Layer::InnerOutline]));
        assert_eq!(surface.nodes_in_layer(Layer::Outline).count(), 1);
        assert_eq!(surface.nodes_in_layer(Layer::InnerOutline).count(), 0);
    }

    #[test]
    fn arrow_markers_are_counted_and_removed() {
        let mut surface = SvgSurface::with_host_nodes(host_nodes());
        assert_eq!(surface.strip_arrow_markers(), 1);
        assert_eq!(surface.strip_arrow_markers(), 0);
        assert!(!surface.render().contains("marker-end"));
    }
}
