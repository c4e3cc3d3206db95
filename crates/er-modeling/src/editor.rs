//! Editor facade: owns the graph, the renderer and one surface per element,
//! and runs queued redraws once the host transaction is over.

use er_core::{
    Bounds, Cardinality, ConnectionKind, Element, ElementGraph, ElementId, ErConfig, ErError,
    ErType, Notation, OperationResult, Point, Property, PropertyValue,
};
use er_layout::{Size, find_free_position, group_bounds, ideal_container_size};
use er_render_svg::{
    ErRenderer, Layer, RenderOutcome, RenderSurface, ShapeRenderer, SvgSurface, redraw_layers,
    render_connection, render_shape,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::events::{Event, EventBus, EventKind};
use crate::modeling::{InMemoryModeling, Modeling};
use crate::queue::Redraw;
use crate::service::{BatchOutcome, PropertyService, UpdateOptions, UpdateOutcome};

/// Gap between a container's border and its children.
const CHILD_PADDING: f64 = 10.0;
/// Space above and below a container title line.
const TITLE_GAP: f64 = 6.0;
const CHILD_ATTRIBUTE_SIZE: Size = Size::new(100.0, 50.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub drawn: usize,
    pub skipped: usize,
    /// Cardinality patches written back after connection redraws.
    pub patched: usize,
}

impl FlushReport {
    fn count(&mut self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Drawn { .. } => self.drawn += 1,
            RenderOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug)]
pub struct Editor<M = InMemoryModeling, S = SvgSurface> {
    graph: ElementGraph,
    renderer: ErRenderer,
    service: PropertyService<M>,
    surfaces: FxHashMap<ElementId, S>,
    config: ErConfig,
}

impl<S: RenderSurface> Editor<InMemoryModeling, S> {
    #[must_use]
    pub fn in_memory(graph: ElementGraph, config: ErConfig) -> Self {
        Self::new(graph, InMemoryModeling::new(), config)
    }
}

impl<M: Modeling, S: RenderSurface> Editor<M, S> {
    #[must_use]
    pub fn new(graph: ElementGraph, modeling: M, config: ErConfig) -> Self {
        Self {
            graph,
            renderer: ErRenderer::new(er_render_svg::DefaultShapeRenderer, &config),
            service: PropertyService::new(modeling, &config),
            surfaces: FxHashMap::default(),
            config,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &ElementGraph {
        &self.graph
    }

    #[must_use]
    pub fn into_graph(self) -> ElementGraph {
        self.graph
    }

    #[must_use]
    pub fn renderer(&self) -> &ErRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn config(&self) -> &ErConfig {
        &self.config
    }

    #[must_use]
    pub fn service(&self) -> &PropertyService<M> {
        &self.service
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        self.service.events_mut()
    }

    /// Register the surface `id` draws into, returning the one it replaces.
    pub fn attach_surface(&mut self, id: impl Into<ElementId>, surface: S) -> Option<S> {
        self.surfaces.insert(id.into(), surface)
    }

    #[must_use]
    pub fn surface(&self, id: &ElementId) -> Option<&S> {
        self.surfaces.get(id)
    }

    pub fn surface_mut(&mut self, id: &ElementId) -> Option<&mut S> {
        self.surfaces.get_mut(id)
    }

    #[must_use]
    pub fn notation(&self) -> Notation {
        self.renderer.notation()
    }

    /// Switch notation for subsequent redraws. Stored cardinalities are kept.
    pub fn set_notation(&mut self, notation: Notation) {
        self.renderer.set_notation(notation);
        self.service.set_notation(notation);
        self.config.notation = notation;
    }

    pub fn update_property(
        &mut self,
        id: &ElementId,
        property: impl Into<Property>,
        value: PropertyValue,
        options: UpdateOptions,
    ) -> UpdateOutcome {
        self.service
            .update_property(&mut self.graph, id, property, value, options)
    }

    pub fn update_properties(
        &mut self,
        id: &ElementId,
        updates: Vec<(Property, PropertyValue)>,
        options: UpdateOptions,
    ) -> BatchOutcome {
        self.service
            .update_properties(&mut self.graph, id, updates, options)
    }

    pub fn resize_shape(&mut self, id: &ElementId, width: f64, height: f64) -> OperationResult {
        self.service.resize_shape(&mut self.graph, id, width, height)
    }

    #[must_use]
    pub fn cardinality_options(&self, connection: &ElementId) -> Vec<Cardinality> {
        self.service.cardinality_options(&self.graph, connection)
    }

    /// Run every pending redraw against the current graph state.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        for (id, redraw) in self.service.queue_mut().drain() {
            let Some(element) = self.graph.get(&id) else {
                debug!(id = %id, "element vanished before redraw");
                continue;
            };
            if !element.is_connection()
                && let Some(surface) = self.surfaces.get_mut(&id)
            {
                surface.relocate(Point::new(element.bounds.x, element.bounds.y));
            }
            match redraw {
                Redraw::Full => {
                    report.count(render_shape(&self.renderer, self.surfaces.get_mut(&id), element));
                    self.service
                        .fire(&Event::new(EventKind::RenderShape, id.clone()));
                }
                Redraw::Partial(layers) => {
                    let layers: Vec<Layer> = layers.into_iter().collect();
                    report.count(redraw_layers(
                        &self.renderer,
                        self.surfaces.get_mut(&id),
                        element,
                        &layers,
                    ));
                }
                Redraw::Connection => {
                    let patch = match self.surfaces.get_mut(&id) {
                        Some(surface) => {
                            let (outcome, patch) = render_connection(
                                &self.renderer,
                                Some(surface),
                                element,
                                &self.graph,
                            );
                            report.count(outcome);
                            patch
                        }
                        None => {
                            report.skipped += 1;
                            self.renderer.draw_connection(element, &self.graph).patch
                        }
                    };
                    if let Some(patch) = patch
                        && self.service.apply_patch(&mut self.graph, &id, patch).success
                    {
                        report.patched += 1;
                    }
                }
            }
        }
        debug!(
            drawn = report.drawn,
            skipped = report.skipped,
            patched = report.patched,
            "flushed redraw queue"
        );
        report
    }

    /// Queue every element and flush.
    pub fn redraw_all(&mut self) -> FlushReport {
        let queue = self.service.queue_mut();
        for element in self.graph.elements() {
            let redraw = if element.is_connection() {
                Redraw::Connection
            } else {
                Redraw::Full
            };
            queue.schedule(element.id.clone(), redraw);
        }
        self.flush()
    }

    /// Move shapes through the host, then queue a full redraw for each moved
    /// shape and a connection redraw for every connection whose path changed.
    pub fn move_elements(&mut self, ids: &[ElementId], delta: Point) -> OperationResult {
        if let Err(error) = self
            .service
            .modeling_mut()
            .move_elements(&mut self.graph, ids, delta)
        {
            return OperationResult::failure(&error);
        }
        for id in ids {
            self.service
                .fire(&Event::new(EventKind::ElementMoved, id.clone()));
        }

        let touched: Vec<ElementId> = self
            .graph
            .elements()
            .iter()
            .filter(|e| {
                e.connection.as_ref().is_some_and(|c| {
                    ids.contains(&e.id) || ids.contains(&c.source) || ids.contains(&c.target)
                })
            })
            .map(|e| e.id.clone())
            .collect();
        let queue = self.service.queue_mut();
        for id in ids {
            if self.graph.get(id).is_some_and(|e| !e.is_connection()) {
                queue.schedule(id.clone(), Redraw::Full);
            }
        }
        for id in touched {
            queue.schedule(id, Redraw::Connection);
        }
        OperationResult::ok(format!("moved {} elements", ids.len()))
    }

    #[must_use]
    pub fn can_connect(&self, source: &ElementId, target: &ElementId) -> bool {
        match (
            self.graph.get(source).and_then(Element::er_type),
            self.graph.get(target).and_then(Element::er_type),
        ) {
            (Some(s), Some(t)) => self.notation().validate_connection(s, t),
            _ => false,
        }
    }

    /// Create a connection the current notation allows.
    ///
    /// # Errors
    ///
    /// [`ErError::InvalidConnection`] when the notation forbids the pair,
    /// [`ErError::ElementNotFound`] for unknown endpoints, or whatever the host reports.
    pub fn connect(
        &mut self,
        source: &ElementId,
        target: &ElementId,
    ) -> Result<ElementId, ErError> {
        let type_of = |id: &ElementId| {
            self.graph
                .get(id)
                .ok_or_else(|| ErError::element_not_found(id))
                .map(|e| e.er_type())
        };
        let (source_type, target_type) = (type_of(source)?, type_of(target)?);
        if !self.can_connect(source, target) {
            let describe =
                |t: Option<ErType>| t.map_or_else(|| String::from("unknown"), |t| t.to_string());
            return Err(ErError::InvalidConnection {
                source_type: describe(source_type),
                target_type: describe(target_type),
                notation: self.notation().to_string(),
            });
        }
        let id = self.service.modeling_mut().create_connection(
            &mut self.graph,
            source,
            target,
            ConnectionKind::Standard,
        )?;
        self.service.queue_mut().schedule(id.clone(), Redraw::Connection);
        Ok(id)
    }

    /// Add a named sub-attribute inside a container at the nearest free
    /// spot, link it with a parent-child connection and grow the container
    /// to fit.
    ///
    /// # Errors
    ///
    /// Fails when `container` is unknown or not a container, or when the host
    /// refuses one of the changes.
    pub fn place_child_attribute(
        &mut self,
        container: &ElementId,
        name: &str,
    ) -> Result<ElementId, ErError> {
        let parent = self
            .graph
            .get(container)
            .ok_or_else(|| ErError::element_not_found(container))?;
        if !parent.er_type().is_some_and(ErType::is_container) {
            return Err(ErError::InvalidValue {
                property: String::from("container"),
                value: container.to_string(),
            });
        }

        let metrics = self.renderer.settings().metrics;
        let title = parent
            .business_object
            .name()
            .unwrap_or(self.renderer.settings().labels().composite_attribute);
        let title_width = metrics.estimate_width(title);
        let title_height = metrics.line_height_px() + TITLE_GAP * 2.0;
        let frame = parent.bounds;

        let siblings: Vec<Bounds> = self
            .graph
            .children_of(container)
            .iter()
            .map(|child| child.bounds)
            .collect();
        let start = Point::new(frame.x + CHILD_PADDING, frame.y + title_height + CHILD_PADDING);
        let position = find_free_position(
            start,
            CHILD_ATTRIBUTE_SIZE,
            &siblings,
            self.config.search_radius,
            self.config.search_step,
        );

        let mut shape = Element::shape(
            "",
            ErType::Attribute,
            Bounds::new(
                position.x,
                position.y,
                CHILD_ATTRIBUTE_SIZE.width,
                CHILD_ATTRIBUTE_SIZE.height,
            ),
        )
        .with_name(name);
        shape.business_object.is_sub_attribute = true;

        let modeling = self.service.modeling_mut();
        let child = modeling.create_shape(&mut self.graph, shape, Some(container))?;
        let link = modeling.create_connection(
            &mut self.graph,
            container,
            &child,
            ConnectionKind::ParentChild,
        )?;

        let children: Vec<Bounds> = self
            .graph
            .children_of(container)
            .iter()
            .map(|c| c.bounds)
            .collect();
        let ideal = ideal_container_size(
            &children,
            title_width,
            CHILD_PADDING,
            title_height,
            Size::new(self.config.min_width, self.config.min_height),
        );
        let (mut width, mut height) = (ideal.width, ideal.height);
        if let Some(group) = group_bounds(&children) {
            width = width.max(group.right() + CHILD_PADDING - frame.x);
            height = height.max(group.bottom() + CHILD_PADDING - frame.y);
        }
        let refit = Bounds::new(
            frame.x,
            frame.y,
            width.max(frame.width),
            height.max(frame.height),
        );
        if refit != frame {
            debug!(
                id = %container,
                width = refit.width,
                height = refit.height,
                "growing container"
            );
            self.service
                .modeling_mut()
                .resize_shape(&mut self.graph, container, refit)?;
            self.service
                .fire(&Event::new(EventKind::ElementChanged, container.clone()));
        }

        let queue = self.service.queue_mut();
        queue.schedule(container.clone(), Redraw::Full);
        queue.schedule(child.clone(), Redraw::Full);
        queue.schedule(link, Redraw::Connection);
        Ok(child)
    }
}
