//! SVG document root and whole-diagram export.

use std::fmt;

use er_core::{Bounds, ElementGraph, ElementId};
use er_layout::group_bounds;

use crate::connection::CardinalityPatch;
use crate::element::SvgElement;
use crate::shape::ShapeRenderer;
use crate::xml::{Attributes, escape_xml, fmt_num};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const EXPORT_PADDING: f64 = 20.0;
const EXPORT_STYLE: &str = "text{font-family:Arial,Helvetica,sans-serif}";

/// Root `<svg>` element of an exported diagram.
///
/// The viewBox doubles as the pixel size so the export opens at 1:1.
#[derive(Debug, Clone, Default)]
pub struct SvgDocument {
    root: Attributes,
    viewbox: Option<Bounds>,
    title: Option<String>,
    description: Option<String>,
    style: Option<String>,
    body: Vec<SvgElement>,
}

impl SvgDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn viewbox(mut self, bounds: Bounds) -> Self {
        self.viewbox = Some(bounds);
        self
    }

    /// Title and description for screen readers; marks the root as `role="img"`.
    #[must_use]
    pub fn accessible(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.description = Some(description.into());
        self.root.set("role", "img");
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.root.add_class(class);
        self
    }

    #[must_use]
    pub fn style(mut self, css: impl Into<String>) -> Self {
        self.style = Some(css.into());
        self
    }

    #[must_use]
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = SvgElement>) -> Self {
        self.body.extend(nodes);
        self
    }

    #[must_use]
    pub fn nodes(&self) -> &[SvgElement] {
        &self.body
    }

    fn serialize(&self) -> String {
        let mut root = Attributes::new();
        root.set("xmlns", SVG_NS);
        if let Some(vb) = self.viewbox {
            let numbers = [vb.x, vb.y, vb.width, vb.height].map(fmt_num);
            root.set("viewBox", numbers.join(" "));
            root.set_num("width", vb.width);
            root.set_num("height", vb.height);
        }
        for (name, value) in self.root.iter() {
            root.set(name, value);
        }

        let mut out = String::with_capacity(4096);
        out.push_str("<svg");
        root.write_into(&mut out);
        out.push('>');
        let headers = [
            ("title", self.title.as_deref()),
            ("desc", self.description.as_deref()),
            ("style", self.style.as_deref()),
        ];
        for (tag, text) in headers {
            if let Some(text) = text {
                out.push_str(&format!("<{tag}>{}</{tag}>", escape_xml(text, false)));
            }
        }
        for node in &self.body {
            node.write_into(&mut out);
        }
        out.push_str("</svg>");
        out
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// A rendered diagram plus the data changes its connections asked for.
#[derive(Debug, Clone)]
pub struct DiagramExport {
    pub document: SvgDocument,
    pub patches: Vec<(ElementId, CardinalityPatch)>,
}

/// Render every element of `graph` into one document.
///
/// Connections go first so shapes sit on top of line ends. Shapes are
/// translated to their position since draw lists are element-local.
#[must_use]
pub fn export_diagram<R: ShapeRenderer + ?Sized>(
    renderer: &R,
    graph: &ElementGraph,
) -> DiagramExport {
    let mut connections = Vec::new();
    let mut shapes = Vec::new();
    let mut patches = Vec::new();
    let mut extents = Vec::new();

    for element in graph.elements() {
        if element.is_connection() {
            let render = renderer.draw_connection(element, graph);
            if let Some(patch) = render.patch {
                patches.push((element.id.clone(), patch));
            }
            let list = render.draw_list.without_arrow_markers();
            extents.extend(list.extent());
            connections.push(list.to_group());
        } else {
            let list = renderer.draw_shape(element);
            extents.push(element.bounds);
            let transform = format!(
                "translate({} {})",
                fmt_num(element.bounds.x),
                fmt_num(element.bounds.y)
            );
            shapes.push(list.to_group().attr("transform", &transform));
        }
    }

    let viewbox = group_bounds(&extents)
        .unwrap_or_default()
        .inflate(EXPORT_PADDING);
    let document = SvgDocument::new()
        .viewbox(viewbox)
        .class("er-diagram")
        .accessible(
            "ER diagram",
            format!("{} elements", graph.len()),
        )
        .style(EXPORT_STYLE)
        .with_nodes(connections)
        .with_nodes(shapes);
    DiagramExport { document, patches }
}
