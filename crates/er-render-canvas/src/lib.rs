#![forbid(unsafe_code)]

//! Canvas adapter for ER draw lists.
//!
//! A canvas has no retained nodes, so [`CanvasSurface`] keeps the commands
//! it last painted and repaints its own region whenever they change.

mod context;

pub use context::{Canvas2dContext, DrawOperation, MockCanvas2dContext, TextAlign, TextBaseline};

use std::f64::consts::TAU;

use er_core::{Bounds, ElementId, Point};
use er_render_svg::{
    DrawCommand, DrawList, Layer, Primitive, RenderSurface, TextAnchor, TextLabel,
};
use tracing::trace;

/// Extra margin cleared around the painted extent to cover stroke widths.
const CLEAR_MARGIN: f64 = 4.0;
const UNDERLINE_OFFSET: f64 = 0.6;

/// Parse an SVG dash array such as `"5,3"` or `"6 4"`.
#[must_use]
pub fn parse_dash(pattern: &str) -> Vec<f64> {
    pattern
        .split([',', ' '])
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

const fn text_align(anchor: TextAnchor) -> TextAlign {
    match anchor {
        TextAnchor::Start => TextAlign::Left,
        TextAnchor::Middle => TextAlign::Center,
        TextAnchor::End => TextAlign::Right,
    }
}

fn trace_path<C: Canvas2dContext + ?Sized>(ctx: &mut C, points: &[Point], closed: bool) {
    ctx.begin_path();
    for (i, point) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(point.x, point.y);
        } else {
            ctx.line_to(point.x, point.y);
        }
    }
    if closed {
        ctx.close_path();
    }
}

fn trace_rounded_rect<C: Canvas2dContext + ?Sized>(ctx: &mut C, bounds: Bounds, radius: f64) {
    let r = radius.max(0.0).min(bounds.width / 2.0).min(bounds.height / 2.0);
    ctx.begin_path();
    if r == 0.0 {
        ctx.rect(bounds.x, bounds.y, bounds.width, bounds.height);
        return;
    }
    let (x, y, right, bottom) = (bounds.x, bounds.y, bounds.right(), bounds.bottom());
    ctx.move_to(x + r, y);
    ctx.arc_to(right, y, right, bottom, r);
    ctx.arc_to(right, bottom, x, bottom, r);
    ctx.arc_to(x, bottom, x, y, r);
    ctx.arc_to(x, y, right, y, r);
    ctx.close_path();
}

fn fill_and_stroke<C: Canvas2dContext + ?Sized>(ctx: &mut C, command: &DrawCommand) {
    let paint = &command.paint;
    if let Some(fill) = &paint.fill {
        ctx.set_fill_style(fill);
        ctx.fill();
    }
    if let Some(stroke) = &paint.stroke {
        ctx.set_stroke_style(stroke);
        ctx.set_line_width(paint.stroke_width);
        ctx.set_line_dash(&paint.dash.map(parse_dash).unwrap_or_default());
        ctx.stroke();
    }
}

fn draw_text<C: Canvas2dContext + ?Sized>(ctx: &mut C, label: &TextLabel, color: Option<&str>) {
    ctx.set_font(&format!("{}px sans-serif", label.font_size));
    ctx.set_text_align(text_align(label.anchor));
    ctx.set_text_baseline(TextBaseline::Middle);
    if let Some(color) = color {
        ctx.set_fill_style(color);
        ctx.set_stroke_style(color);
    }
    let first = label.first_line_y();
    for (i, line) in label.lines.iter().enumerate() {
        let y = first + i as f64 * label.line_height;
        ctx.fill_text(line, label.position.x, y);
        if label.underline && !line.is_empty() {
            let width = ctx.measure_text(line);
            let start = match label.anchor {
                TextAnchor::Start => label.position.x,
                TextAnchor::Middle => label.position.x - width / 2.0,
                TextAnchor::End => label.position.x - width,
            };
            let under = y + label.font_size * UNDERLINE_OFFSET;
            ctx.set_line_width(1.0);
            ctx.set_line_dash(&[]);
            trace_path(ctx, &[Point::new(start, under), Point::new(start + width, under)], false);
            ctx.stroke();
        }
    }
}

/// Paint one command. Each command runs inside its own save/restore pair.
pub fn replay_command<C: Canvas2dContext + ?Sized>(ctx: &mut C, command: &DrawCommand) {
    ctx.save();
    match &command.primitive {
        Primitive::Rect { bounds, radius } => {
            trace_rounded_rect(ctx, *bounds, *radius);
            fill_and_stroke(ctx, command);
        }
        Primitive::Ellipse { center, rx, ry } => {
            ctx.begin_path();
            ctx.ellipse(center.x, center.y, *rx, *ry);
            fill_and_stroke(ctx, command);
        }
        Primitive::Polygon { points } => {
            trace_path(ctx, points, true);
            fill_and_stroke(ctx, command);
        }
        Primitive::Polyline { points } => {
            trace_path(ctx, points, false);
            fill_and_stroke(ctx, command);
        }
        Primitive::Line { from, to } => {
            trace_path(ctx, &[*from, *to], false);
            fill_and_stroke(ctx, command);
        }
        Primitive::Circle { center, radius } => {
            ctx.begin_path();
            ctx.arc(center.x, center.y, *radius, 0.0, TAU);
            fill_and_stroke(ctx, command);
        }
        Primitive::Text(label) => draw_text(ctx, label, command.paint.fill.as_deref()),
    }
    ctx.restore();
}

/// Paint every command of `list`, offset by `origin`.
pub fn replay<C: Canvas2dContext + ?Sized>(ctx: &mut C, list: &DrawList, origin: Point) {
    ctx.save();
    ctx.translate(origin.x, origin.y);
    for command in list.commands() {
        replay_command(ctx, command);
    }
    ctx.restore();
}

/// Canvas region owned by one element.
#[derive(Debug)]
pub struct CanvasSurface<C> {
    ctx: C,
    element: ElementId,
    origin: Point,
    retained: Vec<DrawCommand>,
    painted: Option<Bounds>,
}

impl<C: Canvas2dContext> CanvasSurface<C> {
    /// `origin` is the element position for shapes and zero for connections.
    #[must_use]
    pub fn new(ctx: C, element: ElementId, origin: Point) -> Self {
        Self {
            ctx,
            element,
            origin,
            retained: Vec::new(),
            painted: None,
        }
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Commands currently shown.
    #[must_use]
    pub fn retained(&self) -> &[DrawCommand] {
        &self.retained
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Move the element; the region painted at the previous origin is cleared.
    pub fn set_origin(&mut self, origin: Point) {
        if origin == self.origin {
            return;
        }
        self.origin = origin;
        self.repaint();
    }

    fn retained_list(&self) -> DrawList {
        DrawList::new(self.element.clone(), self.retained.clone())
    }

    fn repaint(&mut self) {
        if let Some(area) = self.painted.take() {
            self.ctx.clear_rect(area.x, area.y, area.width, area.height);
        }
        let list = self.retained_list();
        replay(&mut self.ctx, &list, self.origin);
        // Stored in canvas coordinates so a later origin change still finds it.
        self.painted = list.extent().map(|local| {
            let area = local.inflate(CLEAR_MARGIN);
            Bounds::new(
                area.x + self.origin.x,
                area.y + self.origin.y,
                area.width,
                area.height,
            )
        });
        trace!(id = %self.element, commands = list.len(), "canvas.repaint");
    }
}

impl<C: Canvas2dContext> RenderSurface for CanvasSurface<C> {
    fn clear_visuals(&mut self) {
        self.retained.clear();
    }

    fn clear_layers(&mut self, layers: &[Layer]) {
        self.retained.retain(|command| !layers.contains(&command.layer));
    }

    fn draw(&mut self, list: &DrawList) {
        self.retained.extend(list.commands().iter().cloned());
        self.repaint();
    }

    fn relocate(&mut self, origin: Point) {
        self.set_origin(origin);
    }

    fn strip_arrow_markers(&mut self) -> usize {
        let mut removed = 0;
        for command in &mut self.retained {
            removed += usize::from(command.marker_start.take().is_some());
            removed += usize::from(command.marker_end.take().is_some());
        }
        if removed > 0 {
            self.repaint();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use er_core::{Bounds, Element, ErType};
    use er_render_svg::{ErRenderer, Paint, ShapeRenderer, render_shape};

    use super::*;

    #[test]
    fn dash_patterns_parse() {
        assert_eq!(parse_dash("5,3"), [5.0, 3.0]);
        assert_eq!(parse_dash("6 4"), [6.0, 4.0]);
        assert!(parse_dash("").is_empty());
    }

    #[test]
    fn ellipse_replays_fill_then_dashed_stroke() {
        let command = DrawCommand::new(
            Layer::Outline,
            Primitive::Ellipse {
                center: Point::new(50.0, 25.0),
                rx: 50.0,
                ry: 25.0,
            },
            Paint::filled("#F3E5F5", "#8E24AA", 2.0).dashed("5,3"),
        );
        let mut ctx = MockCanvas2dContext::new(200.0, 200.0);
        replay_command(&mut ctx, &command);
        assert_eq!(
            ctx.operations(),
            [
                DrawOperation::Save,
                DrawOperation::BeginPath,
                DrawOperation::Ellipse(50.0, 25.0, 50.0, 25.0),
                DrawOperation::SetFillStyle("#F3E5F5".into()),
                DrawOperation::Fill,
                DrawOperation::SetStrokeStyle("#8E24AA".into()),
                DrawOperation::SetLineWidth(2.0),
                DrawOperation::SetLineDash(vec![5.0, 3.0]),
                DrawOperation::Stroke,
                DrawOperation::Restore,
            ]
        );
    }

    #[test]
    fn weak_entity_paints_two_outlines_and_a_label() {
        let mut element =
            Element::shape("E1", ErType::Entity, Bounds::new(40.0, 10.0, 140.0, 60.0));
        element.business_object.is_weak = true;
        let renderer = ErRenderer::default();
        let mut surface = CanvasSurface::new(
            MockCanvas2dContext::new(400.0, 300.0),
            element.id.clone(),
            Point::new(element.bounds.x, element.bounds.y),
        );
        render_shape(&renderer, Some(&mut surface), &element);

        let ctx = surface.context();
        assert_eq!(ctx.filled_texts(), ["Entidade Fraca"]);
        assert!(ctx.operations().contains(&DrawOperation::Translate(40.0, 10.0)));
        let strokes = ctx
            .operations()
            .iter()
            .filter(|op| **op == DrawOperation::Stroke)
            .count();
        assert_eq!(strokes, 2);
        assert_eq!(surface.retained().len(), renderer.draw_shape(&element).len());
    }

    #[test]
    fn redraw_clears_previous_region() {
        let element = Element::shape("A1", ErType::Attribute, Bounds::new(0.0, 0.0, 100.0, 50.0));
        let renderer = ErRenderer::default();
        let mut surface = CanvasSurface::new(
            MockCanvas2dContext::new(400.0, 300.0),
            element.id.clone(),
            Point::new(0.0, 0.0),
        );
        render_shape(&renderer, Some(&mut surface), &element);
        surface.context_mut().clear();
        render_shape(&renderer, Some(&mut surface), &element);
        assert_eq!(
            surface.context().operations()[0],
            DrawOperation::ClearRect(-4.0, -4.0, 108.0, 58.0)
        );
        assert_eq!(surface.context().cleared_areas().len(), 1);
        assert_eq!(surface.context().save_depth(), 0);
    }

    #[test]
    fn moving_the_origin_clears_where_the_shape_was() {
        let element = Element::shape("A1", ErType::Attribute, Bounds::new(0.0, 0.0, 100.0, 50.0));
        let renderer = ErRenderer::default();
        let mut surface = CanvasSurface::new(
            MockCanvas2dContext::new(800.0, 600.0),
            element.id.clone(),
            Point::new(0.0, 0.0),
        );
        render_shape(&renderer, Some(&mut surface), &element);
        surface.context_mut().clear();

        surface.set_origin(Point::new(300.0, 300.0));
        let ctx = surface.context();
        assert_eq!(ctx.cleared_areas(), [(-4.0, -4.0, 108.0, 58.0)]);
        assert!(ctx.operations().contains(&DrawOperation::Translate(300.0, 300.0)));

        surface.context_mut().clear();
        surface.set_origin(Point::new(300.0, 300.0));
        assert_eq!(surface.context().operation_count(), 0);
        assert_eq!(surface.origin(), Point::new(300.0, 300.0));
    }

    #[test]
    fn stripping_markers_repaints_once() {
        let list = DrawList::new(
            ElementId::new("C1"),
            vec![
                DrawCommand::new(
                    Layer::Connector,
                    Primitive::Polyline {
                        points: vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
                    },
                    Paint::stroked("#000000", 1.0),
                )
                .with_marker_end("url(#arrow)"),
            ],
        );
        let mut surface = CanvasSurface::new(
            MockCanvas2dContext::new(100.0, 100.0),
            ElementId::new("C1"),
            Point::default(),
        );
        surface.apply(&list, None);
        assert_eq!(surface.strip_arrow_markers(), 1);
        assert_eq!(surface.strip_arrow_markers(), 0);
        assert!(surface.retained().iter().all(|c| !c.has_arrow_markers()));
    }
}
