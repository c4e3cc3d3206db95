//! Property synchronization: validated writes into business objects,
//! change notifications and redraw scheduling.

use er_core::{
    Bounds, Cardinality, Element, ElementGraph, ElementId, ErConfig, ErError, ErType, Notation,
    OperationResult, Property, PropertyValue, WriteStrategy,
};
use er_render_svg::{CardinalityPatch, layers_for_property};
use tracing::{debug, warn};

use crate::events::{Event, EventBus, EventKind, FireReport};
use crate::modeling::Modeling;
use crate::queue::{DeferredQueue, Redraw};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Skip `element.changed` and `er.propertyChanged`.
    pub silent: bool,
}

impl UpdateOptions {
    #[must_use]
    pub const fn silent() -> Self {
        Self { silent: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub result: OperationResult,
    pub property: Property,
    /// Value stored after rules ran, when a write happened.
    pub written: Option<PropertyValue>,
    pub strategy: WriteStrategy,
    pub redraw: Option<Redraw>,
    /// Listeners that failed on the change events. The write itself stands.
    pub listener_errors: Vec<ErError>,
}

impl UpdateOutcome {
    fn failed(property: Property, error: &ErError) -> Self {
        Self {
            strategy: property.write_strategy(),
            result: OperationResult::failure(error),
            property,
            written: None,
            redraw: None,
            listener_errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// First failure, or success when every update went through.
    pub result: OperationResult,
    pub updates: Vec<UpdateOutcome>,
    pub redraw: Option<Redraw>,
}

fn is_cardinality_property(property: &Property) -> bool {
    matches!(
        property,
        Property::CardinalitySource | Property::CardinalityTarget | Property::Cardinality
    )
}

fn connection_types(graph: &ElementGraph, connection: &Element) -> Option<(ErType, ErType)> {
    let data = connection.connection.as_ref()?;
    Some((
        graph.get(&data.source)?.er_type()?,
        graph.get(&data.target)?.er_type()?,
    ))
}

fn attribute_involved(graph: &ElementGraph, connection: &Element) -> bool {
    connection_types(graph, connection)
        .is_some_and(|(s, t)| s.is_attribute_like() || t.is_attribute_like())
}

/// Redraw needed after `properties` changed on `element`.
fn redraw_for(element: &Element, properties: &[Property], batch: bool) -> Option<Redraw> {
    let visual: Vec<&Property> = properties.iter().filter(|p| p.is_visual()).collect();
    if visual.is_empty() {
        return None;
    }
    if element.is_connection() {
        return Some(Redraw::Connection);
    }
    if !batch || visual.iter().any(|p| p.requires_full_redraw()) {
        return Some(Redraw::Full);
    }
    Some(Redraw::partial(
        visual
            .into_iter()
            .flat_map(|p| layers_for_property(p).iter().copied()),
    ))
}

pub struct PropertyService<M> {
    modeling: M,
    events: EventBus,
    queue: DeferredQueue,
    notation: Notation,
    min_width: f64,
    min_height: f64,
}

impl<M: std::fmt::Debug> std::fmt::Debug for PropertyService<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyService")
            .field("modeling", &self.modeling)
            .field("queue", &self.queue.len())
            .field("notation", &self.notation)
            .finish_non_exhaustive()
    }
}

impl<M: Modeling> PropertyService<M> {
    #[must_use]
    pub fn new(modeling: M, config: &ErConfig) -> Self {
        Self {
            modeling,
            events: EventBus::new(),
            queue: DeferredQueue::new(),
            notation: config.notation,
            min_width: config.min_width,
            min_height: config.min_height,
        }
    }

    #[must_use]
    pub fn modeling(&self) -> &M {
        &self.modeling
    }

    pub fn modeling_mut(&mut self) -> &mut M {
        &mut self.modeling
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    #[must_use]
    pub fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut DeferredQueue {
        &mut self.queue
    }

    #[must_use]
    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn set_notation(&mut self, notation: Notation) {
        self.notation = notation;
    }

    pub fn fire(&mut self, event: &Event) -> FireReport {
        self.events.fire(event)
    }

    /// Values an editor may offer for a connection.
    #[must_use]
    pub fn cardinality_options(&self, graph: &ElementGraph, id: &ElementId) -> Vec<Cardinality> {
        graph
            .get(id)
            .and_then(|connection| connection_types(graph, connection))
            .map(|(s, t)| self.notation.cardinality_options(s, t))
            .unwrap_or_default()
    }

    fn default_cardinality(
        &self,
        graph: &ElementGraph,
        connection: &Element,
        property: &Property,
    ) -> Option<Cardinality> {
        let (source, target) = connection_types(graph, connection)?;
        Some(if *property == Property::CardinalityTarget {
            self.notation.default_cardinality(target, source)
        } else {
            self.notation.default_cardinality(source, target)
        })
    }

    fn direct_write(
        graph: &mut ElementGraph,
        id: &ElementId,
        property: &Property,
        value: PropertyValue,
    ) -> Result<(), ErError> {
        graph
            .get_mut(id)
            .ok_or_else(|| ErError::element_not_found(id))?
            .business_object
            .set(property, value)
    }

    fn write(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        property: &Property,
        value: PropertyValue,
    ) -> Result<(), ErError> {
        match property.write_strategy() {
            WriteStrategy::CardinalityDirect | WriteStrategy::Direct => {
                Self::direct_write(graph, id, property, value)
            }
            WriteStrategy::HostMediated => {
                let update = [(property.clone(), value.clone())];
                if let Err(err) = self.modeling.update_properties(graph, id, &update) {
                    warn!(
                        id = %id,
                        property = %property,
                        error = %err,
                        "host update failed, writing directly"
                    );
                    return Self::direct_write(graph, id, property, value);
                }
                Ok(())
            }
        }
    }

    fn update_one(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        property: Property,
        mut value: PropertyValue,
        options: UpdateOptions,
    ) -> UpdateOutcome {
        let Some(element) = graph.get(id) else {
            return UpdateOutcome::failed(property, &ErError::element_not_found(id));
        };
        let bo = &element.business_object;
        let old = bo.get(&property);
        let mut soft_error = None;
        let mut writes = Vec::with_capacity(2);

        if is_cardinality_property(&property) {
            if element.is_connection() && attribute_involved(graph, element) && !value.is_null() {
                let error = ErError::CardinalityNotAllowed { id: id.to_string() };
                return UpdateOutcome::failed(property, &error);
            }
            if let Some(text) = value.as_text() {
                match Cardinality::parse(text) {
                    Some(canonical) => value = PropertyValue::from(canonical.as_str()),
                    None => {
                        let error = ErError::InvalidCardinality {
                            value: text.to_string(),
                        };
                        let Some(fallback) = self.default_cardinality(graph, element, &property)
                        else {
                            return UpdateOutcome::failed(property, &error);
                        };
                        debug!(
                            id = %id,
                            value = text,
                            fallback = fallback.as_str(),
                            "unsupported cardinality"
                        );
                        value = PropertyValue::from(fallback.as_str());
                        soft_error = Some(error);
                    }
                }
            }
        }

        let mut message = format!("{property} updated");
        match property {
            Property::IsPrimaryKey
                if value.as_bool() == Some(true) && bo.flag(&Property::IsMultivalued) =>
            {
                writes.push((Property::IsMultivalued, PropertyValue::Bool(false)));
                message = format!("{property} updated; isMultivalued cleared");
            }
            Property::IsMultivalued
                if value.as_bool() == Some(true) && bo.flag(&Property::IsPrimaryKey) =>
            {
                value = PropertyValue::Bool(false);
                message = String::from("primary key attributes cannot be multivalued");
            }
            _ => {}
        }
        writes.insert(0, (property.clone(), value));

        for (target, value) in &writes {
            if let Err(error) = self.write(graph, id, target, value.clone()) {
                return UpdateOutcome::failed(property, &error);
            }
        }

        let new = graph
            .get(id)
            .map_or(PropertyValue::Null, |e| e.business_object.get(&property));
        let mut listener_errors = Vec::new();
        if property == Property::IsComposite && old != new {
            let event = Event::new(EventKind::CompositeChanged, id.clone()).with_change(
                property.clone(),
                old.clone(),
                new.clone(),
            );
            listener_errors.extend(self.events.fire(&event).failures);
        }
        if !options.silent {
            for (target, _) in &writes {
                let event = if *target == property {
                    Event::new(EventKind::PropertyChanged, id.clone()).with_change(
                        property.clone(),
                        old.clone(),
                        new.clone(),
                    )
                } else {
                    Event::new(EventKind::PropertyChanged, id.clone())
                };
                let event = Event {
                    property: Some(target.clone()),
                    ..event
                };
                listener_errors.extend(self.events.fire(&event).failures);
            }
        }

        UpdateOutcome {
            result: soft_error.map_or_else(
                || OperationResult::ok(message),
                |e| OperationResult::failure(&e),
            ),
            strategy: property.write_strategy(),
            written: Some(new),
            redraw: None,
            listener_errors,
            property,
        }
    }

    /// Validate and write one property, notify listeners and schedule a redraw.
    pub fn update_property(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        property: impl Into<Property>,
        value: PropertyValue,
        options: UpdateOptions,
    ) -> UpdateOutcome {
        let property = property.into();
        let mut outcome = self.update_one(graph, id, property, value, options);
        if outcome.written.is_none() {
            return outcome;
        }
        if !options.silent {
            let report = self
                .events
                .fire(&Event::new(EventKind::ElementChanged, id.clone()));
            outcome.listener_errors.extend(report.failures);
        }
        if let Some(element) = graph.get(id) {
            outcome.redraw = redraw_for(element, std::slice::from_ref(&outcome.property), false);
            if let Some(redraw) = &outcome.redraw {
                self.queue.schedule(id.clone(), redraw.clone());
            }
        }
        outcome
    }

    /// Apply several updates to one element with a single redraw: full when
    /// any update changes identity or outline style, otherwise only the
    /// touched layers.
    pub fn update_properties(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        updates: Vec<(Property, PropertyValue)>,
        options: UpdateOptions,
    ) -> BatchOutcome {
        let mut outcomes = Vec::with_capacity(updates.len());
        for (property, value) in updates {
            outcomes.push(self.update_one(graph, id, property, value, options));
        }

        let touched: Vec<Property> = outcomes
            .iter()
            .filter(|o| o.written.is_some())
            .map(|o| o.property.clone())
            .collect();
        if !touched.is_empty() && !options.silent {
            self.events
                .fire(&Event::new(EventKind::ElementChanged, id.clone()));
        }
        let redraw = graph
            .get(id)
            .and_then(|element| redraw_for(element, &touched, true));
        if let Some(redraw) = &redraw {
            self.queue.schedule(id.clone(), redraw.clone());
        }

        let result = outcomes
            .iter()
            .find(|o| !o.result.success)
            .map_or_else(
                || OperationResult::ok(format!("{} properties updated", touched.len())),
                |o| o.result.clone(),
            );
        BatchOutcome {
            result,
            updates: outcomes,
            redraw,
        }
    }

    /// Resize through the host. Sizes below the configured minimum are refused.
    pub fn resize_shape(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        width: f64,
        height: f64,
    ) -> OperationResult {
        let Some(element) = graph.get(id) else {
            return OperationResult::failure(&ErError::element_not_found(id));
        };
        if width < self.min_width || height < self.min_height {
            return OperationResult::failure(&ErError::InvalidDimensions {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        let bounds = Bounds::new(element.bounds.x, element.bounds.y, width, height);
        if let Err(error) = self.modeling.resize_shape(graph, id, bounds) {
            warn!(id = %id, error = %error, "resize refused by host");
            return OperationResult::failure(&error);
        }
        self.queue.schedule(id.clone(), Redraw::Full);
        self.events
            .fire(&Event::new(EventKind::ElementChanged, id.clone()));
        OperationResult::ok(format!("resized to {width}x{height}"))
    }

    /// Store the cardinality decision of a connection redraw.
    ///
    /// Writes are direct and schedule nothing, since they describe what the
    /// redraw already shows.
    pub fn apply_patch(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        patch: CardinalityPatch,
    ) -> OperationResult {
        for (property, value) in patch.writes() {
            if let Err(error) = Self::direct_write(graph, id, &property, value) {
                return OperationResult::failure(&error);
            }
        }
        self.events
            .fire(&Event::new(EventKind::ConnectionChanged, id.clone()));
        OperationResult::ok(format!("cardinality patch {patch:?} applied"))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use er_core::{ErrorCode, Point};
    use er_render_svg::Layer;

    use super::*;
    use crate::modeling::InMemoryModeling;

    fn graph() -> ElementGraph {
        ElementGraph::from_elements(vec![
            Element::shape("E", ErType::Entity, Bounds::new(0.0, 0.0, 120.0, 60.0)),
            Element::shape("F", ErType::Entity, Bounds::new(300.0, 0.0, 120.0, 60.0)),
            Element::shape("A", ErType::Attribute, Bounds::new(0.0, 200.0, 100.0, 50.0)),
            Element::connection(
                "EF",
                "E",
                "F",
                vec![Point::new(120.0, 30.0), Point::new(300.0, 30.0)],
            ),
            Element::connection(
                "EA",
                "E",
                "A",
                vec![Point::new(60.0, 60.0), Point::new(50.0, 200.0)],
            ),
        ])
    }

    fn service() -> PropertyService<InMemoryModeling> {
        PropertyService::new(InMemoryModeling::new(), &ErConfig::default())
    }

    fn record(
        service: &mut PropertyService<InMemoryModeling>,
        kind: EventKind,
    ) -> Rc<RefCell<Vec<Event>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        service.events_mut().on(kind, move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn primary_key_clears_multivalued() {
        let mut graph = graph();
        let mut service = service();
        let id = ElementId::new("A");
        let defaults = UpdateOptions::default();
        service.update_property(&mut graph, &id, "isMultivalued", true.into(), defaults);
        let outcome =
            service.update_property(&mut graph, &id, "isPrimaryKey", true.into(), defaults);
        assert!(outcome.result.success);
        let bo = &graph.get(&id).expect("A").business_object;
        assert!(bo.is_primary_key);
        assert!(!bo.is_multivalued);
    }

    #[test]
    fn multivalued_on_a_primary_key_is_coerced() {
        let mut graph = graph();
        let mut service = service();
        let id = ElementId::new("A");
        let defaults = UpdateOptions::default();
        service.update_property(&mut graph, &id, Property::IsPrimaryKey, true.into(), defaults);
        let outcome = service.update_property(
            &mut graph,
            &id,
            Property::IsMultivalued,
            true.into(),
            defaults,
        );
        assert_eq!(outcome.written, Some(PropertyValue::Bool(false)));
        assert!(!graph.get(&id).expect("A").business_object.is_multivalued);
    }

    #[test]
    fn attribute_connections_refuse_cardinality() {
        let mut graph = graph();
        let mut service = service();
        let outcome = service.update_property(
            &mut graph,
            &"EA".into(),
            "cardinalitySource",
            "1..N".into(),
            UpdateOptions::default(),
        );
        assert_eq!(outcome.result.code, Some(ErrorCode::CardinalityNotAllowed));
        assert!(graph.get(&"EA".into()).expect("EA").business_object.cardinality_source.is_none());
        assert!(service.queue().is_empty());
    }

    #[test]
    fn unsupported_cardinality_falls_back_to_default() {
        let mut graph = graph();
        let mut service = service();
        let outcome = service.update_property(
            &mut graph,
            &"EF".into(),
            "cardinalityTarget",
            "muitos".into(),
            UpdateOptions::default(),
        );
        assert_eq!(outcome.result.code, Some(ErrorCode::InvalidCardinality));
        assert_eq!(
            graph.get(&"EF".into()).expect("EF").business_object.cardinality_target.as_deref(),
            Some("1..1")
        );
        assert_eq!(service.queue().get(&"EF".into()), Some(&Redraw::Connection));
    }

    #[test]
    fn cardinality_values_are_canonicalized() {
        let mut graph = graph();
        let mut service = service();
        let outcome = service.update_property(
            &mut graph,
            &"EF".into(),
            Property::CardinalitySource,
            "0..n".into(),
            UpdateOptions::default(),
        );
        assert!(outcome.result.success);
        assert_eq!(outcome.strategy, WriteStrategy::CardinalityDirect);
        assert_eq!(outcome.written, Some(PropertyValue::from("0..N")));
    }

    #[test]
    fn silent_updates_fire_no_change_events() {
        let mut graph = graph();
        let mut service = service();
        let changed = record(&mut service, EventKind::ElementChanged);
        let property = record(&mut service, EventKind::PropertyChanged);
        let silent = UpdateOptions::silent();
        service.update_property(&mut graph, &"E".into(), "isWeak", true.into(), silent);
        assert!(changed.borrow().is_empty());
        assert!(property.borrow().is_empty());

        let defaults = UpdateOptions::default();
        service.update_property(&mut graph, &"E".into(), "isWeak", false.into(), defaults);
        assert_eq!(changed.borrow().len(), 1);
        let event = &property.borrow()[0];
        assert_eq!(event.old_value, Some(PropertyValue::Bool(true)));
        assert_eq!(event.new_value, Some(PropertyValue::Bool(false)));
    }

    #[test]
    fn composite_changes_are_announced() {
        let mut graph = graph();
        let mut service = service();
        let composite = record(&mut service, EventKind::CompositeChanged);
        let id = ElementId::new("A");
        let (silent, defaults) = (UpdateOptions::silent(), UpdateOptions::default());
        service.update_property(&mut graph, &id, "isComposite", true.into(), silent);
        service.update_property(&mut graph, &id, "isComposite", true.into(), defaults);
        assert_eq!(composite.borrow().len(), 1);
    }

    #[test]
    fn host_mediated_writes_fall_back_when_the_host_refuses() {
        let mut graph = graph();
        let mut service = PropertyService::new(InMemoryModeling::rejecting(), &ErConfig::default());
        let outcome = service.update_property(
            &mut graph,
            &"E".into(),
            "bioc:fill",
            "#FF0000".into(),
            UpdateOptions::default(),
        );
        assert!(outcome.result.success);
        assert_eq!(outcome.strategy, WriteStrategy::HostMediated);
        assert_eq!(
            graph
                .get(&"E".into())
                .expect("E")
                .business_object
                .text(&Property::parse("bioc:fill")),
            Some("#FF0000")
        );
    }

    #[test]
    fn non_visual_properties_do_not_redraw() {
        let mut graph = graph();
        let mut service = service();
        let outcome = service.update_property(
            &mut graph,
            &"A".into(),
            "dataType",
            "VARCHAR".into(),
            UpdateOptions::default(),
        );
        assert_eq!(outcome.redraw, None);
        assert!(service.queue().is_empty());
    }

    #[test]
    fn batch_redraw_is_partial_unless_identity_changes() {
        let mut graph = graph();
        let mut service = service();
        let batch = service.update_properties(
            &mut graph,
            &"A".into(),
            vec![
                (Property::IsRequired, true.into()),
                (Property::IsDerived, true.into()),
            ],
            UpdateOptions::default(),
        );
        assert!(batch.result.success);
        assert_eq!(
            batch.redraw,
            Some(Redraw::partial([Layer::Label, Layer::Outline, Layer::InnerOutline]))
        );

        let batch = service.update_properties(
            &mut graph,
            &"E".into(),
            vec![(Property::Name, "Cliente".into()), (Property::IsRequired, true.into())],
            UpdateOptions::default(),
        );
        assert_eq!(batch.redraw, Some(Redraw::Full));
    }

    #[test]
    fn resize_below_minimum_is_refused() {
        let mut graph = graph();
        let mut service = service();
        let result = service.resize_shape(&mut graph, &"E".into(), 30.0, 60.0);
        assert_eq!(result.code, Some(ErrorCode::InvalidDimensions));
        assert_eq!(graph.get(&"E".into()).expect("E").bounds.width, 120.0);

        let result = service.resize_shape(&mut graph, &"E".into(), 50.0, 30.0);
        assert!(result.success);
        assert_eq!(graph.get(&"E".into()).expect("E").bounds.width, 50.0);
    }

    #[test]
    fn missing_elements_report_not_found() {
        let mut graph = graph();
        let mut service = service();
        let outcome = service.update_property(
            &mut graph,
            &"nope".into(),
            "name",
            "x".into(),
            UpdateOptions::default(),
        );
        assert_eq!(outcome.result.code, Some(ErrorCode::ElementNotFound));
    }

    #[test]
    fn options_follow_notation_and_endpoints() {
        let service = service();
        let graph = graph();
        assert_eq!(service.cardinality_options(&graph, &"EF".into()).len(), 4);
        assert!(service.cardinality_options(&graph, &"EA".into()).is_empty());
    }
}
