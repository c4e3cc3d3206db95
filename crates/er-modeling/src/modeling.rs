//! Host mutation API.
//!
//! Every structural change (creating shapes, moving, resizing) goes through
//! [`Modeling`], which stands in for the host framework's command stack.

use er_core::{
    Bounds, ConnectionKind, Element, ElementGraph, ElementId, ErError, Point, Property,
    PropertyValue,
};
use tracing::debug;

pub trait Modeling {
    /// # Errors
    ///
    /// Fails when the element is unknown or the host refuses the change.
    fn update_properties(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        properties: &[(Property, PropertyValue)],
    ) -> Result<(), ErError>;

    /// # Errors
    ///
    /// Fails when the element is unknown or the host refuses the change.
    fn resize_shape(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        bounds: Bounds,
    ) -> Result<(), ErError>;

    /// Translate shapes and the connection ends attached to them.
    ///
    /// # Errors
    ///
    /// Fails when any element is unknown or the host refuses the change.
    fn move_elements(
        &mut self,
        graph: &mut ElementGraph,
        ids: &[ElementId],
        delta: Point,
    ) -> Result<(), ErError>;

    /// Insert `element`, assigning an id when it has none.
    ///
    /// # Errors
    ///
    /// Fails when `parent` is unknown or the host refuses the change.
    fn create_shape(
        &mut self,
        graph: &mut ElementGraph,
        element: Element,
        parent: Option<&ElementId>,
    ) -> Result<ElementId, ErError>;

    /// # Errors
    ///
    /// Fails when an endpoint is unknown or the host refuses the change.
    fn create_connection(
        &mut self,
        graph: &mut ElementGraph,
        source: &ElementId,
        target: &ElementId,
        kind: ConnectionKind,
    ) -> Result<ElementId, ErError>;
}

/// Host call recorded by [`InMemoryModeling`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    UpdateProperties(ElementId),
    ResizeShape(ElementId),
    MoveElements(Vec<ElementId>),
    CreateShape(ElementId),
    CreateConnection(ElementId),
}

/// Host implementation over the element graph itself.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModeling {
    rejecting: bool,
    next_id: usize,
    calls: Vec<HostCall>,
}

impl InMemoryModeling {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that refuses every change, as a failing command stack would.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            rejecting: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    fn guard(&self, operation: &str) -> Result<(), ErError> {
        if self.rejecting {
            return Err(ErError::HostRejected {
                message: format!("{operation} refused"),
            });
        }
        Ok(())
    }

    fn fresh_id(&mut self, graph: &ElementGraph, prefix: &str) -> ElementId {
        loop {
            self.next_id += 1;
            let id = ElementId::new(format!("{prefix}_{}", self.next_id));
            if !graph.contains(&id) {
                return id;
            }
        }
    }
}

fn shape_mut<'a>(graph: &'a mut ElementGraph, id: &ElementId) -> Result<&'a mut Element, ErError> {
    graph
        .get_mut(id)
        .ok_or_else(|| ErError::element_not_found(id))
}

impl Modeling for InMemoryModeling {
    fn update_properties(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        properties: &[(Property, PropertyValue)],
    ) -> Result<(), ErError> {
        self.guard("updateProperties")?;
        let element = shape_mut(graph, id)?;
        for (property, value) in properties {
            element.business_object.set(property, value.clone())?;
        }
        self.calls.push(HostCall::UpdateProperties(id.clone()));
        Ok(())
    }

    fn resize_shape(
        &mut self,
        graph: &mut ElementGraph,
        id: &ElementId,
        bounds: Bounds,
    ) -> Result<(), ErError> {
        self.guard("resizeShape")?;
        shape_mut(graph, id)?.bounds = bounds;
        self.calls.push(HostCall::ResizeShape(id.clone()));
        Ok(())
    }

    fn move_elements(
        &mut self,
        graph: &mut ElementGraph,
        ids: &[ElementId],
        delta: Point,
    ) -> Result<(), ErError> {
        self.guard("moveElements")?;
        if let Some(missing) = ids.iter().find(|id| !graph.contains(id)) {
            return Err(ErError::element_not_found(missing));
        }

        let moved = |id: &ElementId| ids.contains(id);
        let connection_ids: Vec<ElementId> = graph
            .elements()
            .iter()
            .filter(|e| e.is_connection())
            .map(|e| e.id.clone())
            .collect();

        for id in ids {
            let element = shape_mut(graph, id)?;
            if !element.is_connection() {
                element.bounds.x += delta.x;
                element.bounds.y += delta.y;
            }
        }

        for id in connection_ids {
            let element = shape_mut(graph, &id)?;
            let explicitly_moved = moved(&id);
            let Some(data) = element.connection.as_mut() else {
                continue;
            };
            let (source_moved, target_moved) = (moved(&data.source), moved(&data.target));
            if explicitly_moved || (source_moved && target_moved) {
                for point in &mut data.waypoints {
                    *point = point.translate(delta.x, delta.y);
                }
            } else {
                if source_moved && let Some(first) = data.waypoints.first_mut() {
                    *first = first.translate(delta.x, delta.y);
                }
                if target_moved && let Some(last) = data.waypoints.last_mut() {
                    *last = last.translate(delta.x, delta.y);
                }
            }
        }

        self.calls.push(HostCall::MoveElements(ids.to_vec()));
        Ok(())
    }

    fn create_shape(
        &mut self,
        graph: &mut ElementGraph,
        mut element: Element,
        parent: Option<&ElementId>,
    ) -> Result<ElementId, ErError> {
        self.guard("createShape")?;
        if let Some(parent) = parent {
            shape_mut(graph, parent)?;
            element.parent = Some(parent.clone());
        }
        if element.id.as_str().is_empty() {
            let prefix = element
                .host_type
                .rsplit(':')
                .next()
                .unwrap_or("Shape")
                .to_string();
            element.id = self.fresh_id(graph, &prefix);
        }
        let id = element.id.clone();
        graph.insert(element);
        if let Some(parent) = parent {
            shape_mut(graph, parent)?.children.push(id.clone());
        }
        debug!(id = %id, "host created shape");
        self.calls.push(HostCall::CreateShape(id.clone()));
        Ok(id)
    }

    fn create_connection(
        &mut self,
        graph: &mut ElementGraph,
        source: &ElementId,
        target: &ElementId,
        kind: ConnectionKind,
    ) -> Result<ElementId, ErError> {
        self.guard("createConnection")?;
        let from = graph
            .get(source)
            .ok_or_else(|| ErError::element_not_found(source))?
            .bounds
            .center();
        let to = graph
            .get(target)
            .ok_or_else(|| ErError::element_not_found(target))?
            .bounds
            .center();

        let id = self.fresh_id(graph, "Connection");
        let mut connection =
            Element::connection(id.clone(), source.clone(), target.clone(), vec![from, to])
                .with_kind(kind);
        if kind == ConnectionKind::ParentChild {
            connection.host_type = String::from("er:ParentChildConnection");
        }
        graph.insert(connection);
        debug!(id = %id, source = %source, target = %target, "host created connection");
        self.calls.push(HostCall::CreateConnection(id.clone()));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use er_core::ErType;

    use super::*;

    fn graph() -> ElementGraph {
        ElementGraph::from_elements(vec![
            Element::shape("A", ErType::Entity, Bounds::new(0.0, 0.0, 100.0, 50.0)),
            Element::shape("B", ErType::Entity, Bounds::new(200.0, 0.0, 100.0, 50.0)),
            Element::connection(
                "AB",
                "A",
                "B",
                vec![
                    Point::new(100.0, 25.0),
                    Point::new(150.0, 25.0),
                    Point::new(200.0, 25.0),
                ],
            ),
        ])
    }

    #[test]
    fn moving_one_end_drags_only_that_waypoint() {
        let mut graph = graph();
        let mut host = InMemoryModeling::new();
        host.move_elements(&mut graph, &["B".into()], Point::new(0.0, 40.0))
            .expect("move");
        let waypoints = graph.get(&"AB".into()).expect("connection").waypoints().to_vec();
        assert_eq!(waypoints[0], Point::new(100.0, 25.0));
        assert_eq!(waypoints[1], Point::new(150.0, 25.0));
        assert_eq!(waypoints[2], Point::new(200.0, 65.0));
        assert_eq!(graph.get(&"B".into()).expect("B").bounds.y, 40.0);
    }

    #[test]
    fn moving_both_ends_translates_the_whole_path() {
        let mut graph = graph();
        let mut host = InMemoryModeling::new();
        host.move_elements(&mut graph, &["A".into(), "B".into()], Point::new(10.0, 0.0))
            .expect("move");
        let waypoints = graph.get(&"AB".into()).expect("connection").waypoints().to_vec();
        assert_eq!(waypoints[1], Point::new(160.0, 25.0));
    }

    #[test]
    fn created_shapes_get_ids_and_parents() {
        let mut graph = graph();
        let mut host = InMemoryModeling::new();
        let shape = Element::shape("", ErType::Attribute, Bounds::new(0.0, 0.0, 80.0, 40.0));
        let id = host
            .create_shape(&mut graph, shape, Some(&"A".into()))
            .expect("create");
        assert_eq!(id.as_str(), "Attribute_1");
        assert_eq!(graph.get(&"A".into()).expect("A").children, [id.clone()]);
        assert_eq!(host.calls(), [HostCall::CreateShape(id)]);
    }

    #[test]
    fn connections_run_center_to_center() {
        let mut graph = graph();
        let mut host = InMemoryModeling::new();
        let id = host
            .create_connection(&mut graph, &"A".into(), &"B".into(), ConnectionKind::ParentChild)
            .expect("connect");
        let connection = graph.get(&id).expect("connection");
        assert!(connection.is_parent_child());
        assert_eq!(
            connection.waypoints(),
            [Point::new(50.0, 25.0), Point::new(250.0, 25.0)]
        );
    }

    #[test]
    fn rejecting_host_refuses_and_leaves_the_graph_alone() {
        let mut graph = graph();
        let mut host = InMemoryModeling::rejecting();
        let err = host
            .resize_shape(&mut graph, &"A".into(), Bounds::new(0.0, 0.0, 300.0, 300.0))
            .expect_err("rejected");
        assert_eq!(err.code(), er_core::ErrorCode::HostRejected);
        assert_eq!(graph.get(&"A".into()).expect("A").bounds.width, 100.0);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn unknown_elements_are_reported() {
        let mut graph = graph();
        let mut host = InMemoryModeling::new();
        let err = host
            .update_properties(
                &mut graph,
                &"missing".into(),
                &[(Property::Name, PropertyValue::from("x"))],
            )
            .expect_err("missing");
        assert_eq!(err, ErError::ElementNotFound { id: "missing".into() });
    }
}
