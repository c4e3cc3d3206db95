//! Redraw requests collected during a host transaction and run afterwards.

use std::collections::BTreeSet;

use er_core::ElementId;
use er_render_svg::Layer;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redraw {
    Full,
    Partial(BTreeSet<Layer>),
    Connection,
}

impl Redraw {
    #[must_use]
    pub fn partial<I: IntoIterator<Item = Layer>>(layers: I) -> Self {
        Self::Partial(layers.into_iter().collect())
    }

    /// Coalesce two requests for the same element. Full and connection
    /// redraws cover every layer; partial requests union their layers.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Connection, _) | (_, Self::Connection) => Self::Connection,
            (Self::Full, _) | (_, Self::Full) => Self::Full,
            (Self::Partial(mut a), Self::Partial(b)) => {
                a.extend(b);
                Self::Partial(a)
            }
        }
    }
}

/// Pending redraws, one entry per element, kept in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    order: Vec<ElementId>,
    pending: FxHashMap<ElementId, Redraw>,
}

impl DeferredQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: ElementId, redraw: Redraw) {
        match self.pending.remove(&id) {
            Some(existing) => {
                self.pending.insert(id, existing.merge(redraw));
            }
            None => {
                self.order.push(id.clone());
                self.pending.insert(id, redraw);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Redraw> {
        self.pending.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take every pending request, oldest first.
    pub fn drain(&mut self) -> Vec<(ElementId, Redraw)> {
        let mut pending = std::mem::take(&mut self.pending);
        std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|id| pending.remove(&id).map(|redraw| (id, redraw)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn requests_for_one_element_coalesce() {
        let mut queue = DeferredQueue::new();
        queue.schedule("A".into(), Redraw::partial([Layer::Label]));
        queue.schedule("B".into(), Redraw::Connection);
        queue.schedule("A".into(), Redraw::partial([Layer::Outline]));
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.get(&"A".into()),
            Some(&Redraw::partial([Layer::Label, Layer::Outline]))
        );

        queue.schedule("A".into(), Redraw::Full);
        let drained = queue.drain();
        assert_eq!(
            drained,
            [
                (ElementId::new("A"), Redraw::Full),
                (ElementId::new("B"), Redraw::Connection)
            ]
        );
        assert!(queue.is_empty());
    }

    fn any_redraw() -> impl Strategy<Value = Redraw> {
        prop_oneof![
            Just(Redraw::Full),
            Just(Redraw::Connection),
            proptest::sample::subsequence(Layer::ALL.to_vec(), 0..=5).prop_map(Redraw::partial),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn merge_never_loses_coverage(a in any_redraw(), b in any_redraw()) {
            let merged = a.clone().merge(b.clone());
            for side in [a, b] {
                match (&merged, side) {
                    (Redraw::Partial(all), Redraw::Partial(part)) => {
                        prop_assert!(part.is_subset(all));
                    }
                    (Redraw::Partial(_), other) => {
                        prop_assert!(false, "partial absorbed {other:?}");
                    }
                    _ => {}
                }
            }
        }
    }
}
