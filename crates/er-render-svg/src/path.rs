//! Path data builder and outline paths for the ER shapes.

use er_core::{Bounds, Point};

use crate::xml::fmt_num;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc {
        rx: f64,
        ry: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    Close,
}

impl PathCommand {
    fn render(&self, output: &mut String) {
        match *self {
            Self::MoveTo { x, y } => {
                output.push('M');
                push_pair(output, x, y);
            }
            Self::LineTo { x, y } => {
                output.push('L');
                push_pair(output, x, y);
            }
            Self::Arc {
                rx,
                ry,
                large_arc,
                sweep,
                x,
                y,
            } => {
                output.push('A');
                push_pair(output, rx, ry);
                output.push_str(if large_arc { " 0 1 " } else { " 0 0 " });
                output.push_str(if sweep { "1 " } else { "0 " });
                push_pair(output, x, y);
            }
            Self::Close => output.push('Z'),
        }
    }
}

fn push_pair(output: &mut String, x: f64, y: f64) {
    output.push_str(&fmt_num(x));
    output.push(' ');
    output.push_str(&fmt_num(y));
}

/// Fluent builder for SVG path `d` strings.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    commands: Vec<PathCommand>,
}

impl PathBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::MoveTo { x, y });
        self
    }

    #[must_use]
    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::LineTo { x, y });
        self
    }

    #[must_use]
    pub fn arc_to(
        mut self,
        rx: f64,
        ry: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) -> Self {
        self.commands.push(PathCommand::Arc {
            rx,
            ry,
            large_arc,
            sweep,
            x,
            y,
        });
        self
    }

    #[must_use]
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    #[must_use]
    pub fn build(&self) -> String {
        let mut output = String::with_capacity(self.commands.len() * 12);
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                output.push(' ');
            }
            command.render(&mut output);
        }
        output
    }
}

/// Rounded rectangle outline. The radius is clamped to half the shorter side.
#[must_use]
pub fn rounded_rect_path(bounds: Bounds, radius: f64) -> String {
    let r = radius.max(0.0).min(bounds.width / 2.0).min(bounds.height / 2.0);
    let (x, y, right, bottom) = (bounds.x, bounds.y, bounds.right(), bounds.bottom());
    if r == 0.0 {
        return PathBuilder::new()
            .move_to(x, y)
            .line_to(right, y)
            .line_to(right, bottom)
            .line_to(x, bottom)
            .close()
            .build();
    }
    PathBuilder::new()
        .move_to(x + r, y)
        .line_to(right - r, y)
        .arc_to(r, r, false, true, right, y + r)
        .line_to(right, bottom - r)
        .arc_to(r, r, false, true, right - r, bottom)
        .line_to(x + r, bottom)
        .arc_to(r, r, false, true, x, bottom - r)
        .line_to(x, y + r)
        .arc_to(r, r, false, true, x + r, y)
        .close()
        .build()
}

/// Corners of the relationship diamond, clockwise from the top.
#[must_use]
pub fn diamond_points(bounds: Bounds) -> [Point; 4] {
    let center = bounds.center();
    [
        Point::new(center.x, bounds.y),
        Point::new(bounds.right(), center.y),
        Point::new(center.x, bounds.bottom()),
        Point::new(bounds.x, center.y),
    ]
}

#[must_use]
pub fn polygon_path(points: &[Point]) -> String {
    let mut builder = PathBuilder::new();
    for (i, point) in points.iter().enumerate() {
        builder = if i == 0 {
            builder.move_to(point.x, point.y)
        } else {
            builder.line_to(point.x, point.y)
        };
    }
    if !points.is_empty() {
        builder = builder.close();
    }
    builder.build()
}

#[must_use]
pub fn polyline_path(points: &[Point]) -> String {
    let mut builder = PathBuilder::new();
    for (i, point) in points.iter().enumerate() {
        builder = if i == 0 {
            builder.move_to(point.x, point.y)
        } else {
            builder.line_to(point.x, point.y)
        };
    }
    builder.build()
}

/// Ellipse inscribed in `bounds`, as two half arcs.
#[must_use]
pub fn ellipse_path(bounds: Bounds) -> String {
    let center = bounds.center();
    let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
    PathBuilder::new()
        .move_to(bounds.x, center.y)
        .arc_to(rx, ry, false, true, bounds.right(), center.y)
        .arc_to(rx, ry, false, true, bounds.x, center.y)
        .close()
        .build()
}
