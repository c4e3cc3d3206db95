#![forbid(unsafe_code)]

//! ER shape and connection rendering.
//!
//! Renderers turn an element into an immutable [`DrawList`]; surfaces
//! ([`SvgSurface`] here, a canvas in `er-render-canvas`) apply it. Style
//! resolution, label wrapping and SVG serialization live alongside.

mod connection;
mod document;
mod element;
mod path;
mod scene;
mod shape;
mod style;
mod surface;
mod text;
mod xml;

pub use connection::{CardinalityPatch, ConnectionDecision, classify_connection};
pub use document::{DiagramExport, SvgDocument, export_diagram};
pub use element::{ElementKind, SvgElement};
pub use path::{
    PathBuilder, PathCommand, diamond_points, ellipse_path, polygon_path, polyline_path,
    rounded_rect_path,
};
pub use scene::{DrawCommand, DrawList, Layer, Paint, Primitive, TextLabel, layers_for_property};
pub use shape::{
    ConnectionRender, DefaultShapeRenderer, ErRenderer, RenderOutcome, RenderSettings,
    ShapeRenderer, redraw_layers, render_connection, render_shape,
};
pub use style::{
    ElementColors, ErPalette, ParseThemePresetError, Rgb, ThemePreset, contrast_color,
    element_colors, is_color_dark, parse_hex_color,
};
pub use surface::{HOST_HELPER_CLASSES, RenderSurface, SvgSurface};
pub use text::{TextAnchor, TextMetrics};
pub use xml::{Attributes, escape_xml, fmt_num};
