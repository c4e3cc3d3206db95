//! Named notifications between the editor, the service and listeners.

use er_core::{ElementId, ErError, Property, PropertyValue};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ElementChanged,
    PropertyChanged,
    CompositeChanged,
    RenderShape,
    ElementMoved,
    ConnectionChanged,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::ElementChanged,
        Self::PropertyChanged,
        Self::CompositeChanged,
        Self::RenderShape,
        Self::ElementMoved,
        Self::ConnectionChanged,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementChanged => "element.changed",
            Self::PropertyChanged => "er.propertyChanged",
            Self::CompositeChanged => "element.compositeChanged",
            Self::RenderShape => "render.shape",
            Self::ElementMoved => "element.moved",
            Self::ConnectionChanged => "connection.changed",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub element: ElementId,
    pub property: Option<Property>,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, element: ElementId) -> Self {
        Self {
            kind,
            element,
            property: None,
            old_value: None,
            new_value: None,
        }
    }

    #[must_use]
    pub fn with_change(
        mut self,
        property: Property,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Self {
        self.property = Some(property);
        self.old_value = Some(old);
        self.new_value = Some(new);
        self
    }
}

/// A listener reports failure as a message; the bus logs it and moves on.
pub type Listener = Box<dyn FnMut(&Event) -> Result<(), String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What happened when an event was fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FireReport {
    /// Listeners that returned `Ok`.
    pub delivered: usize,
    pub failures: Vec<ErError>,
}

impl FireReport {
    /// No listener failed. Also true when nobody was listening.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// # Errors
    ///
    /// The first listener failure, when any listener failed.
    pub fn into_result(self) -> Result<usize, ErError> {
        match self.failures.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.delivered),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Event) -> Result<(), String> + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    /// A failing listener is logged and reported; the rest still run.
    pub fn fire(&mut self, event: &Event) -> FireReport {
        let mut report = FireReport::default();
        for (id, kind, listener) in &mut self.listeners {
            if *kind != event.kind {
                continue;
            }
            match listener(event) {
                Ok(()) => report.delivered += 1,
                Err(message) => {
                    warn!(
                        listener = id.0,
                        event = event.kind.as_str(),
                        element = %event.element,
                        %message,
                        "event listener failed"
                    );
                    report.failures.push(ErError::ListenerFailed {
                        event: event.kind.as_str().to_owned(),
                        listener: id.0,
                        message,
                    });
                }
            }
        }
        trace!(
            event = event.kind.as_str(),
            element = %event.element,
            delivered = report.delivered,
            failed = report.failures.len(),
            "event fired"
        );
        report
    }
}
