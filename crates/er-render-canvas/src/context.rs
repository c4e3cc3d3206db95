//! The subset of the 2D canvas API that ER replay needs, plus a recording
//! context for tests.

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Vertical text baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
}

impl TextBaseline {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Alphabetic => "alphabetic",
        }
    }
}

/// Drawing target for replayed ER draw lists.
///
/// Mirrors the browser `CanvasRenderingContext2D` methods of the same name, so
/// a web host can forward each call unchanged. `measure_text` only reports
/// the advance width; underlines are the one consumer.
pub trait Canvas2dContext {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64);
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn measure_text(&self, text: &str) -> f64;
}

/// One recorded call on a [`MockCanvas2dContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOperation {
    Save,
    Restore,
    Translate(f64, f64),
    SetFillStyle(String),
    SetStrokeStyle(String),
    SetLineWidth(f64),
    SetLineDash(Vec<f64>),
    SetFont(String),
    SetTextAlign(TextAlign),
    SetTextBaseline(TextBaseline),
    BeginPath,
    ClosePath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Arc(f64, f64, f64, f64, f64),
    ArcTo(f64, f64, f64, f64, f64),
    Ellipse(f64, f64, f64, f64),
    Rect(f64, f64, f64, f64),
    Fill,
    Stroke,
    FillText(String, f64, f64),
    ClearRect(f64, f64, f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
struct Pen {
    fill: String,
    stroke: String,
    line_width: f64,
    dash: Vec<f64>,
    font: String,
    align: TextAlign,
    offset: (f64, f64),
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            fill: String::from("#000000"),
            stroke: String::from("#000000"),
            line_width: 1.0,
            dash: Vec::new(),
            font: String::from("10px sans-serif"),
            align: TextAlign::Left,
            offset: (0.0, 0.0),
        }
    }
}

impl Pen {
    fn font_px(&self) -> f64 {
        self.font
            .split_whitespace()
            .find_map(|part| part.strip_suffix("px")?.parse::<f64>().ok())
            .unwrap_or(10.0)
    }
}

/// Records every call and tracks the pen through save/restore, so tests can
/// assert both on the call sequence and on the state at the end.
#[derive(Debug, Clone)]
pub struct MockCanvas2dContext {
    width: f64,
    height: f64,
    ops: Vec<DrawOperation>,
    pen: Pen,
    saved: Vec<Pen>,
}

impl MockCanvas2dContext {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            pen: Pen::default(),
            saved: Vec::new(),
        }
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn operations(&self) -> &[DrawOperation] {
        &self.ops
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.ops.len()
    }

    /// Text of every `fill_text` call, in order.
    #[must_use]
    pub fn filled_texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOperation::FillText(text, _, _) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Areas wiped with `clear_rect`, as `(x, y, width, height)`.
    #[must_use]
    pub fn cleared_areas(&self) -> Vec<(f64, f64, f64, f64)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                DrawOperation::ClearRect(x, y, w, h) => Some((x, y, w, h)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn fill_style(&self) -> &str {
        &self.pen.fill
    }

    #[must_use]
    pub fn stroke_style(&self) -> &str {
        &self.pen.stroke
    }

    #[must_use]
    pub fn line_dash(&self) -> &[f64] {
        &self.pen.dash
    }

    #[must_use]
    pub fn font(&self) -> &str {
        &self.pen.font
    }

    #[must_use]
    pub fn text_align(&self) -> TextAlign {
        self.pen.align
    }

    /// Current translation, summed over nested `translate` calls.
    #[must_use]
    pub fn offset(&self) -> (f64, f64) {
        self.pen.offset
    }

    /// Save depth that has not been restored yet.
    #[must_use]
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    /// Forget recorded calls; the pen is kept.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Canvas2dContext for MockCanvas2dContext {
    fn save(&mut self) {
        self.saved.push(self.pen.clone());
        self.ops.push(DrawOperation::Save);
    }

    fn restore(&mut self) {
        if let Some(pen) = self.saved.pop() {
            self.pen = pen;
        }
        self.ops.push(DrawOperation::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.pen.offset.0 += x;
        self.pen.offset.1 += y;
        self.ops.push(DrawOperation::Translate(x, y));
    }

    fn set_fill_style(&mut self, color: &str) {
        self.pen.fill = color.to_owned();
        self.ops.push(DrawOperation::SetFillStyle(color.to_owned()));
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.pen.stroke = color.to_owned();
        self.ops.push(DrawOperation::SetStrokeStyle(color.to_owned()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.pen.line_width = width;
        self.ops.push(DrawOperation::SetLineWidth(width));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.pen.dash = segments.to_vec();
        self.ops.push(DrawOperation::SetLineDash(segments.to_vec()));
    }

    fn set_font(&mut self, font: &str) {
        self.pen.font = font.to_owned();
        self.ops.push(DrawOperation::SetFont(font.to_owned()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.pen.align = align;
        self.ops.push(DrawOperation::SetTextAlign(align));
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.ops.push(DrawOperation::SetTextBaseline(baseline));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOperation::BeginPath);
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOperation::ClosePath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOperation::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOperation::LineTo(x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.ops.push(DrawOperation::Arc(x, y, radius, start, end));
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) {
        self.ops.push(DrawOperation::ArcTo(x1, y1, x2, y2, radius));
    }

    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) {
        self.ops.push(DrawOperation::Ellipse(x, y, rx, ry));
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOperation::Rect(x, y, width, height));
    }

    fn fill(&mut self) {
        self.ops.push(DrawOperation::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOperation::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOperation::FillText(text.to_owned(), x, y));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOperation::ClearRect(x, y, width, height));
    }

    // Monospace estimate at 0.6em per character.
    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.pen.font_px() * 0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_brings_back_the_saved_pen() {
        let mut ctx = MockCanvas2dContext::new(100.0, 100.0);
        ctx.set_fill_style("#FFF3E0");
        ctx.save();
        ctx.set_fill_style("#E65100");
        ctx.set_line_dash(&[5.0, 3.0]);
        ctx.translate(10.0, 20.0);
        assert_eq!(ctx.offset(), (10.0, 20.0));
        ctx.restore();

        assert_eq!(ctx.fill_style(), "#FFF3E0");
        assert!(ctx.line_dash().is_empty());
        assert_eq!(ctx.offset(), (0.0, 0.0));
        assert_eq!(ctx.save_depth(), 0);
        assert_eq!(ctx.operation_count(), 6);
    }

    #[test]
    fn unbalanced_restore_keeps_the_pen() {
        let mut ctx = MockCanvas2dContext::new(10.0, 10.0);
        ctx.set_stroke_style("#3F51B5");
        ctx.restore();
        assert_eq!(ctx.stroke_style(), "#3F51B5");
    }

    #[test]
    fn text_width_follows_the_font_size() {
        let mut ctx = MockCanvas2dContext::new(10.0, 10.0);
        assert_eq!(ctx.measure_text("abcde"), 30.0);
        ctx.set_font("20px sans-serif");
        assert_eq!(ctx.measure_text("abcde"), 60.0);
        assert_eq!(ctx.measure_text(""), 0.0);
    }

    #[test]
    fn texts_and_cleared_areas_are_collected() {
        let mut ctx = MockCanvas2dContext::new(10.0, 10.0);
        ctx.clear_rect(-4.0, -4.0, 108.0, 58.0);
        ctx.fill_text("Pedido", 50.0, 25.0);
        ctx.fill_text("codigo*", 50.0, 40.0);
        assert_eq!(ctx.filled_texts(), ["Pedido", "codigo*"]);
        assert_eq!(ctx.cleared_areas(), [(-4.0, -4.0, 108.0, 58.0)]);
        ctx.clear();
        assert_eq!(ctx.operation_count(), 0);
        assert_eq!(ctx.size(), (10.0, 10.0));
    }
}
