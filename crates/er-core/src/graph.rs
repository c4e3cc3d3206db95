use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{Element, ElementId, ErType};
use crate::notation::Notation;

/// Id-indexed element store that preserves insertion order.
#[derive(Debug, Clone, Default)]
pub struct ElementGraph {
    elements: Vec<Element>,
    index: FxHashMap<ElementId, usize>,
}

impl ElementGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut graph = Self::new();
        for element in elements {
            graph.insert(element);
        }
        graph
    }

    /// Insert or replace an element. Replacement keeps the original position.
    pub fn insert(&mut self, element: Element) -> Option<Element> {
        if let Some(&slot) = self.index.get(&element.id) {
            return Some(std::mem::replace(&mut self.elements[slot], element));
        }
        self.index.insert(element.id.clone(), self.elements.len());
        self.elements.push(element);
        None
    }

    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let slot = self.index.remove(id)?;
        let removed = self.elements.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        if let Some(parent) = removed.parent.as_ref().and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| child != id);
        }
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.index.get(id).map(|&slot| &self.elements[slot])
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        let slot = *self.index.get(id)?;
        self.elements.get_mut(slot)
    }

    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Connections with `id` as source or target.
    pub fn connections_of<'a>(&'a self, id: &'a ElementId) -> impl Iterator<Item = &'a Element> {
        self.elements.iter().filter(move |element| {
            element
                .connection
                .as_ref()
                .is_some_and(|c| &c.source == id || &c.target == id)
        })
    }

    #[must_use]
    pub fn children_of(&self, id: &ElementId) -> Vec<&Element> {
        let Some(parent) = self.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<&Element> = parent
            .children
            .iter()
            .filter_map(|child| self.get(child))
            .collect();
        for element in &self.elements {
            if element.parent.as_ref() == Some(id)
                && !children.iter().any(|known| known.id == element.id)
            {
                children.push(element);
            }
        }
        children
    }

    /// Live source and target of a connection.
    #[must_use]
    pub fn endpoints(&self, connection_id: &ElementId) -> Option<(&Element, &Element)> {
        let connection = self.get(connection_id)?.connection.as_ref()?;
        Some((self.get(&connection.source)?, self.get(&connection.target)?))
    }

    #[must_use]
    pub fn endpoint_types(
        &self,
        connection_id: &ElementId,
    ) -> Option<(Option<ErType>, Option<ErType>)> {
        self.endpoints(connection_id)
            .map(|(source, target)| (source.er_type(), target.er_type()))
    }
}

/// Serialized diagram exchanged with the command-line tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiagramDocument {
    #[serde(default)]
    pub notation: Notation,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl DiagramDocument {
    #[must_use]
    pub fn into_graph(self) -> (Notation, ElementGraph) {
        (self.notation, ElementGraph::from_elements(self.elements))
    }

    #[must_use]
    pub fn from_graph(notation: Notation, graph: &ElementGraph) -> Self {
        Self {
            notation,
            elements: graph.elements().to_vec(),
        }
    }
}
