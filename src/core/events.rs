//! Event listener registry — register handlers on elements and dispatch
//! events to them with root-ward bubbling.
//!
//! The registry is kept outside the [`Document`] so handlers can borrow the
//! event mutably while dispatch reads the tree for the bubble path.

use std::collections::HashMap;

use super::dom::{Document, NodeId};

// ───────────────────────────────────────── event model ───────

/// The kinds of events elements can listen for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyPress,
    FocusIn,
    FocusOut,
    Custom(String),
}

/// A dispatched event.  `target` is the element the event was fired at;
/// handlers further up the bubble path see the same event.
#[derive(Debug)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    /// Free-form payload (key name, custom data, …).
    pub detail: Option<String>,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            detail: None,
            propagation_stopped: false,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Stop the event from bubbling past the current element.  Handlers on
    /// the current element still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

// ───────────────────────────────────────── registry ──────────

/// Handle returned by [`EventRegistry::add_listener`], used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&mut Event)>;

/// Listener table keyed by `(element, event kind)`.
///
/// Listeners on one element run in registration order.  Removal via
/// [`ListenerId`] is idempotent.
#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    listeners: HashMap<(NodeId, EventKind), Vec<(ListenerId, Handler)>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` events on `node`.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        handler: impl FnMut(&mut Event) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry((node, kind))
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove a previously registered listener.  Unknown ids are a no-op.
    pub fn remove_listener(&mut self, id: ListenerId) {
        for handlers in self.listeners.values_mut() {
            handlers.retain(|(hid, _)| *hid != id);
        }
        self.listeners.retain(|_, handlers| !handlers.is_empty());
    }

    /// Number of registered listeners (across all elements and kinds).
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Fire an event at `target` and bubble it root-ward.
    ///
    /// Handlers on the target run first, then each ancestor's, unless a
    /// handler called [`Event::stop_propagation`].  Detached targets still
    /// dispatch (their bubble path simply ends early).  Returns the number
    /// of handlers that ran.
    pub fn dispatch(&mut self, doc: &Document, mut event: Event) -> usize {
        let mut ran = 0;
        let mut cur = Some(event.target);
        while let Some(node) = cur {
            if let Some(handlers) = self.listeners.get_mut(&(node, event.kind.clone())) {
                for (_, handler) in handlers.iter_mut() {
                    handler(&mut event);
                    ran += 1;
                }
            }
            if event.propagation_stopped {
                break;
            }
            cur = doc.parent(node);
        }
        ran
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("body");
        let outer = doc.create_element("div");
        let inner = doc.create_element("button");
        doc.append_child(doc.root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        (doc, outer, inner)
    }

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let (doc, outer, inner) = sample();
        let mut reg = EventRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        reg.add_listener(inner, EventKind::Click, move |_| o.borrow_mut().push("inner"));
        let o = Rc::clone(&order);
        reg.add_listener(outer, EventKind::Click, move |_| o.borrow_mut().push("outer"));

        let ran = reg.dispatch(&doc, Event::new(EventKind::Click, inner));
        assert_eq!(ran, 2);
        assert_eq!(*order.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn stop_propagation_halts_bubbling() {
        let (doc, outer, inner) = sample();
        let mut reg = EventRegistry::new();

        reg.add_listener(inner, EventKind::Click, |ev| ev.stop_propagation());
        reg.add_listener(outer, EventKind::Click, |_| {
            panic!("must not bubble past inner");
        });

        let ran = reg.dispatch(&doc, Event::new(EventKind::Click, inner));
        assert_eq!(ran, 1);
    }

    #[test]
    fn listeners_fire_in_registration_order_for_matching_kind_only() {
        let (doc, _outer, inner) = sample();
        let mut reg = EventRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        reg.add_listener(inner, EventKind::Click, move |_| o.borrow_mut().push(1));
        let o = Rc::clone(&order);
        reg.add_listener(inner, EventKind::Click, move |_| o.borrow_mut().push(2));
        reg.add_listener(inner, EventKind::FocusIn, |_| panic!("wrong kind"));

        reg.dispatch(&doc, Event::new(EventKind::Click, inner));
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn remove_listener_is_idempotent() {
        let (doc, _outer, inner) = sample();
        let mut reg = EventRegistry::new();

        let id = reg.add_listener(inner, EventKind::Click, |_| {});
        assert_eq!(reg.len(), 1);
        reg.remove_listener(id);
        reg.remove_listener(id);
        assert!(reg.is_empty());
        assert_eq!(reg.dispatch(&doc, Event::new(EventKind::Click, inner)), 0);
    }

    #[test]
    fn custom_events_carry_detail() {
        let (doc, _outer, inner) = sample();
        let mut reg = EventRegistry::new();
        let seen = Rc::new(RefCell::new(None));

        let s = Rc::clone(&seen);
        reg.add_listener(inner, EventKind::Custom("fade-done".into()), move |ev| {
            *s.borrow_mut() = ev.detail.clone();
        });

        let ev = Event::new(EventKind::Custom("fade-done".into()), inner).with_detail("in");
        reg.dispatch(&doc, ev);
        assert_eq!(seen.borrow().as_deref(), Some("in"));
    }
}
