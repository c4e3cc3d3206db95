//! Shape renderers for ER elements.
//!
//! [`ErRenderer`] draws entities, relationships, attributes and attribute
//! containers, and hands anything it does not recognize to a fallback
//! renderer it wraps. Output is a [`DrawList`] in element-local coordinates
//! for shapes and diagram coordinates for connections.

use er_core::{
    Bounds, Element, ElementGraph, ErConfig, ErType, Locale, LocaleLabels,
    Notation, Point, Property,
};
use tracing::{debug, warn};

use crate::connection::{CardinalityPatch, draw_er_connection};
use crate::path::{diamond_points, ellipse_path, polygon_path, polyline_path, rounded_rect_path};
use crate::scene::{DrawCommand, DrawList, Layer, Paint, Primitive, TextLabel};
use crate::style::{ErPalette, ThemePreset, contrast_color, element_colors};
use crate::surface::RenderSurface;
use crate::text::{TextAnchor, TextMetrics};

const ENTITY_RADIUS: f64 = 6.0;
const CONTAINER_RADIUS: f64 = 8.0;
const DOUBLE_BORDER_INSET: f64 = 4.0;
const LABEL_PADDING: f64 = 8.0;
const CONTAINER_TITLE_TOP: f64 = 6.0;
const CONTAINER_DASH: &str = "6,4";
const DERIVED_DASH: &str = "5,3";
const OUTLINE_WIDTH: f64 = 2.0;
const INNER_OUTLINE_WIDTH: f64 = 1.5;
const PRIMARY_KEY_WIDTH: f64 = 3.0;
const SUB_ATTRIBUTE_WIDTH: f64 = 1.5;
const REQUIRED_SUFFIX: &str = "*";

const HOST_FILL: &str = "#FFFFFF";
const HOST_STROKE: &str = "#000000";
const HOST_ARROW: &str = "url(#connection-end)";

/// Connection draw list plus the cardinality decision for the modeling layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRender {
    pub draw_list: DrawList,
    pub patch: Option<CardinalityPatch>,
}

/// Host renderer contract.
pub trait ShapeRenderer {
    fn can_render(&self, element: &Element) -> bool;

    fn draw_shape(&self, element: &Element) -> DrawList;

    fn draw_connection(&self, connection: &Element, graph: &ElementGraph) -> ConnectionRender;

    /// Outline path in diagram coordinates, used for hit testing and
    /// connection docking.
    fn shape_path(&self, element: &Element) -> String;
}

/// The host framework's plain rectangle and arrowed polyline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShapeRenderer;

impl ShapeRenderer for DefaultShapeRenderer {
    fn can_render(&self, _element: &Element) -> bool {
        true
    }

    fn draw_shape(&self, element: &Element) -> DrawList {
        let local = Bounds::new(0.0, 0.0, element.bounds.width, element.bounds.height);
        let mut commands = vec![DrawCommand::new(
            Layer::Outline,
            Primitive::Rect {
                bounds: local,
                radius: 0.0,
            },
            Paint::filled(HOST_FILL, HOST_STROKE, OUTLINE_WIDTH),
        )];
        if let Some(name) = element.business_object.name() {
            commands.push(DrawCommand::new(
                Layer::Label,
                Primitive::Text(TextLabel {
                    position: local.center(),
                    lines: vec![name.to_string()],
                    font_size: TextMetrics::default().font_size,
                    line_height: TextMetrics::default().line_height_px(),
                    anchor: TextAnchor::Middle,
                    underline: false,
                }),
                Paint::text(HOST_STROKE),
            ));
        }
        DrawList::new(element.id.clone(), commands)
    }

    fn draw_connection(&self, connection: &Element, _graph: &ElementGraph) -> ConnectionRender {
        let command = DrawCommand::new(
            Layer::Connector,
            Primitive::Polyline {
                points: connection.waypoints().to_vec(),
            },
            Paint::stroked(HOST_STROKE, OUTLINE_WIDTH),
        )
        .with_marker_end(HOST_ARROW);
        ConnectionRender {
            draw_list: DrawList::new(connection.id.clone(), vec![command]),
            patch: None,
        }
    }

    fn shape_path(&self, element: &Element) -> String {
        if element.is_connection() {
            polyline_path(element.waypoints())
        } else {
            rounded_rect_path(element.bounds, 0.0)
        }
    }
}

/// Everything a draw call needs besides the element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub notation: Notation,
    pub locale: Locale,
    pub palette: ErPalette,
    pub metrics: TextMetrics,
    pub color_customization: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_config(&ErConfig::default())
    }
}

impl RenderSettings {
    #[must_use]
    pub fn from_config(config: &ErConfig) -> Self {
        let preset = config.theme.parse::<ThemePreset>().unwrap_or_else(|err| {
            warn!(theme = %config.theme, error = %err, "unknown theme preset, using default");
            ThemePreset::Default
        });
        Self {
            notation: config.notation,
            locale: config.locale,
            palette: ErPalette::from_preset(preset),
            metrics: TextMetrics::for_font_size(config.label_font_size),
            color_customization: config.color_customization,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &'static LocaleLabels {
        self.locale.labels()
    }

    pub(crate) fn label(&self, position: Point, lines: Vec<String>, underline: bool) -> Primitive {
        Primitive::Text(TextLabel {
            position,
            lines,
            font_size: self.metrics.font_size,
            line_height: self.metrics.line_height_px(),
            anchor: TextAnchor::Middle,
            underline,
        })
    }
}

/// ER-aware renderer that delegates unknown elements to `D`.
#[derive(Debug, Clone)]
pub struct ErRenderer<D = DefaultShapeRenderer> {
    fallback: D,
    settings: RenderSettings,
}

impl Default for ErRenderer {
    fn default() -> Self {
        Self::new(DefaultShapeRenderer, &ErConfig::default())
    }
}

impl<D: ShapeRenderer> ErRenderer<D> {
    #[must_use]
    pub fn new(fallback: D, config: &ErConfig) -> Self {
        Self {
            fallback,
            settings: RenderSettings::from_config(config),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    #[must_use]
    pub fn notation(&self) -> Notation {
        self.settings.notation
    }

    /// Plain assignment: stored data is not revisited until the next redraw.
    pub fn set_notation(&mut self, notation: Notation) {
        self.settings.notation = notation;
    }

    #[must_use]
    pub fn fallback(&self) -> &D {
        &self.fallback
    }

    fn draw_entity(&self, element: &Element, local: Bounds) -> Vec<DrawCommand> {
        let bo = &element.business_object;
        let colors = element_colors(
            element,
            &self.settings.palette,
            self.settings.color_customization,
        );
        let weak = bo.flag(&Property::IsWeak);

        let mut commands = vec![DrawCommand::new(
            Layer::Outline,
            Primitive::Rect {
                bounds: local,
                radius: ENTITY_RADIUS,
            },
            Paint::filled(&colors.fill, &colors.stroke, OUTLINE_WIDTH),
        )];
        if weak {
            commands.push(DrawCommand::new(
                Layer::InnerOutline,
                Primitive::Rect {
                    bounds: local.inflate(-DOUBLE_BORDER_INSET),
                    radius: ENTITY_RADIUS - DOUBLE_BORDER_INSET / 2.0,
                },
                Paint::stroked(contrast_color(&colors.fill), INNER_OUTLINE_WIDTH),
            ));
        }

        let labels = self.settings.labels();
        let placeholder = if weak { labels.weak_entity } else { labels.entity };
        let text = bo.name().unwrap_or(placeholder);
        commands.push(self.centered_label(text, local, local.width, &colors.fill, false));
        commands
    }

    fn draw_relationship(&self, element: &Element, local: Bounds) -> Vec<DrawCommand> {
        let bo = &element.business_object;
        let colors = element_colors(
            element,
            &self.settings.palette,
            self.settings.color_customization,
        );

        let mut commands = vec![DrawCommand::new(
            Layer::Outline,
            Primitive::Polygon {
                points: diamond_points(local).to_vec(),
            },
            Paint::filled(&colors.fill, &colors.stroke, OUTLINE_WIDTH),
        )];
        if bo.flag(&Property::IsIdentifying) {
            commands.push(DrawCommand::new(
                Layer::InnerOutline,
                Primitive::Polygon {
                    points: diamond_points(local.inflate(-DOUBLE_BORDER_INSET)).to_vec(),
                },
                Paint::stroked(&colors.stroke, INNER_OUTLINE_WIDTH),
            ));
        }

        let text = bo.name().unwrap_or(self.settings.labels().relationship);
        // Text stays inside the middle of the diamond.
        commands.push(self.centered_label(text, local, local.width * 0.75, &colors.fill, false));
        commands
    }

    fn draw_attribute(&self, element: &Element, local: Bounds) -> Vec<DrawCommand> {
        let bo = &element.business_object;
        let colors = element_colors(
            element,
            &self.settings.palette,
            self.settings.color_customization,
        );
        let primary_key = bo.flag(&Property::IsPrimaryKey);
        let derived = bo.flag(&Property::IsDerived);

        let stroke_width = if primary_key {
            PRIMARY_KEY_WIDTH
        } else if bo.flag(&Property::IsSubAttribute) {
            SUB_ATTRIBUTE_WIDTH
        } else {
            OUTLINE_WIDTH
        };
        let mut outline = Paint::filled(&colors.fill, &colors.stroke, stroke_width);
        if derived {
            outline = outline.dashed(DERIVED_DASH);
        }

        let center = local.center();
        let (rx, ry) = (local.width / 2.0, local.height / 2.0);
        let mut commands = vec![DrawCommand::new(
            Layer::Outline,
            Primitive::Ellipse { center, rx, ry },
            outline,
        )];
        // Primary key wins over multivalued, same as the palette.
        if bo.flag(&Property::IsMultivalued) && !primary_key {
            let mut inner = Paint::stroked(&colors.stroke, INNER_OUTLINE_WIDTH);
            if derived {
                inner = inner.dashed(DERIVED_DASH);
            }
            commands.push(DrawCommand::new(
                Layer::InnerOutline,
                Primitive::Ellipse {
                    center,
                    rx: (rx - DOUBLE_BORDER_INSET).max(0.0),
                    ry: (ry - DOUBLE_BORDER_INSET).max(0.0),
                },
                inner,
            ));
        }

        let mut text = bo
            .name()
            .unwrap_or(self.settings.labels().attribute)
            .to_string();
        if bo.flag(&Property::IsRequired) {
            text.push_str(REQUIRED_SUFFIX);
        }
        // Ellipse interior is narrower than its box.
        commands.push(self.centered_label(
            &text,
            local,
            local.width * 0.8,
            &colors.fill,
            primary_key,
        ));
        commands
    }

    fn draw_container(
        &self,
        element: &Element,
        er_type: ErType,
        local: Bounds,
    ) -> Vec<DrawCommand> {
        let bo = &element.business_object;
        let colors = element_colors(
            element,
            &self.settings.palette,
            self.settings.color_customization,
        );
        let labels = self.settings.labels();
        let placeholder = if er_type == ErType::CompositeAttribute {
            labels.composite_attribute
        } else {
            labels.sub_attribute
        };
        let title = bo.name().unwrap_or(placeholder);

        let lines = self
            .settings
            .metrics
            .wrap(title, (local.width - LABEL_PADDING * 2.0).max(0.0));
        let line_height = self.settings.metrics.line_height_px();
        let block_height = line_height * lines.len() as f64;
        let position = Point::new(local.center().x, CONTAINER_TITLE_TOP + block_height / 2.0);

        vec![
            DrawCommand::new(
                Layer::Outline,
                Primitive::Rect {
                    bounds: local,
                    radius: CONTAINER_RADIUS,
                },
                Paint::filled(&colors.fill, &colors.stroke, INNER_OUTLINE_WIDTH)
                    .dashed(CONTAINER_DASH),
            ),
            DrawCommand::new(
                Layer::Label,
                self.settings.label(position, lines, false),
                Paint::text(contrast_color(&colors.fill)),
            ),
        ]
    }

    fn centered_label(
        &self,
        text: &str,
        local: Bounds,
        max_width: f64,
        fill: &str,
        underline: bool,
    ) -> DrawCommand {
        let lines = self
            .settings
            .metrics
            .wrap(text, (max_width - LABEL_PADDING * 2.0).max(0.0));
        DrawCommand::new(
            Layer::Label,
            self.settings.label(local.center(), lines, underline),
            Paint::text(contrast_color(fill)),
        )
    }
}

impl<D: ShapeRenderer> ShapeRenderer for ErRenderer<D> {
    fn can_render(&self, element: &Element) -> bool {
        if element.is_connection() {
            return element.host_type.starts_with("er:") || element.is_parent_child();
        }
        element.er_type().is_some()
    }

    fn draw_shape(&self, element: &Element) -> DrawList {
        let Some(er_type) = element.er_type() else {
            debug!(
                id = %element.id,
                host_type = %element.host_type,
                "no ER type, using fallback shape"
            );
            return self.fallback.draw_shape(element);
        };
        let local = Bounds::new(0.0, 0.0, element.bounds.width, element.bounds.height);
        let commands = match er_type {
            ErType::Entity => self.draw_entity(element, local),
            ErType::Relationship => self.draw_relationship(element, local),
            ErType::Attribute => self.draw_attribute(element, local),
            ErType::SubAttribute | ErType::CompositeAttribute => {
                self.draw_container(element, er_type, local)
            }
        };
        DrawList::new(element.id.clone(), commands)
    }

    fn draw_connection(&self, connection: &Element, graph: &ElementGraph) -> ConnectionRender {
        if !self.can_render(connection) {
            debug!(
                id = %connection.id,
                host_type = %connection.host_type,
                "foreign connection, using fallback"
            );
            return self.fallback.draw_connection(connection, graph);
        }
        draw_er_connection(&self.settings, connection, graph)
    }

    fn shape_path(&self, element: &Element) -> String {
        if element.is_connection() {
            return polyline_path(element.waypoints());
        }
        let bounds = element.bounds;
        match element.er_type() {
            Some(ErType::Entity) => rounded_rect_path(bounds, ENTITY_RADIUS),
            Some(ErType::Relationship) => polygon_path(&diamond_points(bounds)),
            Some(ErType::Attribute) => ellipse_path(bounds),
            Some(ErType::SubAttribute | ErType::CompositeAttribute) => {
                rounded_rect_path(bounds, CONTAINER_RADIUS)
            }
            None => self.fallback.shape_path(element),
        }
    }
}

/// Result of a render request against an optional surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn { commands: usize },
    Skipped,
}

/// Draw `element` onto `surface`. A missing surface draws nothing.
pub fn render_shape<R, S>(renderer: &R, surface: Option<&mut S>, element: &Element) -> RenderOutcome
where
    R: ShapeRenderer + ?Sized,
    S: RenderSurface + ?Sized,
{
    let Some(surface) = surface else {
        debug!(id = %element.id, "no surface, skipping draw");
        return RenderOutcome::Skipped;
    };
    let list = renderer.draw_shape(element);
    surface.apply(&list, None);
    RenderOutcome::Drawn {
        commands: list.len(),
    }
}

/// Redraw only `layers` of `element`.
pub fn redraw_layers<R, S>(
    renderer: &R,
    surface: Option<&mut S>,
    element: &Element,
    layers: &[Layer],
) -> RenderOutcome
where
    R: ShapeRenderer + ?Sized,
    S: RenderSurface + ?Sized,
{
    let Some(surface) = surface else {
        return RenderOutcome::Skipped;
    };
    let list = renderer.draw_shape(element).filter_layers(layers);
    surface.apply(&list, Some(layers));
    RenderOutcome::Drawn {
        commands: list.len(),
    }
}

/// Draw a connection and strip any arrow markers left on the surface.
/// The cardinality patch is returned for the caller to apply.
pub fn render_connection<R, S>(
    renderer: &R,
    surface: Option<&mut S>,
    connection: &Element,
    graph: &ElementGraph,
) -> (RenderOutcome, Option<CardinalityPatch>)
where
    R: ShapeRenderer + ?Sized,
    S: RenderSurface + ?Sized,
{
    let Some(surface) = surface else {
        debug!(id = %connection.id, "no surface, skipping connection");
        return (RenderOutcome::Skipped, None);
    };
    let ConnectionRender { draw_list, patch } = renderer.draw_connection(connection, graph);
    surface.apply(&draw_list, None);
    if renderer.can_render(connection) {
        let stripped = surface.strip_arrow_markers();
        if stripped > 0 {
            debug!(id = %connection.id, stripped, "removed arrow markers");
        }
    }
    (
        RenderOutcome::Drawn {
            commands: draw_list.len(),
        },
        patch,
    )
}
