use er_core::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<Bounds> for Size {
    fn from(bounds: Bounds) -> Self {
        Self::new(bounds.width, bounds.height)
    }
}

/// Smallest box containing every rectangle, or `None` for an empty group.
#[must_use]
pub fn group_bounds(rects: &[Bounds]) -> Option<Bounds> {
    let first = rects.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.right(), first.bottom());
    for rect in &rects[1..] {
        min_x = min_x.min(rect.x);
        min_y = min_y.min(rect.y);
        max_x = max_x.max(rect.right());
        max_y = max_y.max(rect.bottom());
    }
    Some(Bounds::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Container size that fits its title and every child with `padding` around them.
#[must_use]
pub fn ideal_container_size(
    children: &[Bounds],
    title_width: f64,
    padding: f64,
    title_height: f64,
    min: Size,
) -> Size {
    let title_span = title_width + padding * 2.0;
    let (content_width, content_height) =
        group_bounds(children).map_or((0.0, 0.0), |group| (group.width, group.height));

    let width = (content_width + padding * 2.0).max(title_span).max(min.width);
    let height = (title_height + content_height + padding * 2.0).max(min.height);
    Size::new(width, height)
}
