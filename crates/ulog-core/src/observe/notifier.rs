//! Observer registry and coalescing delivery

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::scheduler::Scheduler;
use super::target::{List, Node, NodeId, Target};
use super::value::Value;

/// Property name matching every property of a target
pub const WILDCARD: &str = "*";

/// Handle identifying one observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// What happened to an observed property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The property was assigned a new value
    Replaced,
    /// A property of a record held (possibly deeper) under the property was assigned
    Updated,
    /// Elements were appended to a list held under the property
    Appended(usize),
}

/// A delivered notification
#[derive(Debug, Clone)]
pub struct Change {
    /// Name of the observed property (the root name for nested changes)
    pub property: String,
    pub kind: ChangeKind,
    /// Current value of the property
    pub value: Value,
    /// Value before the first of the coalesced mutations
    pub old: Value,
}

impl Change {
    pub fn is_replaced(&self) -> bool {
        self.kind == ChangeKind::Replaced
    }

    pub fn is_append(&self) -> bool {
        matches!(self.kind, ChangeKind::Appended(_))
    }
}

type Callback = Rc<dyn Fn(&Change)>;

struct Registration {
    id: ObserverId,
    node: NodeId,
    property: String,
    include_subproperties: bool,
    callback: Callback,
}

impl Registration {
    fn matches(&self, node: NodeId, property: &str) -> bool {
        self.node == node && (self.property == WILDCARD || self.property == property)
    }
}

/// Mutation effect recorded against a (record, property) pair
#[derive(Clone)]
pub(crate) enum Effect {
    Replaced { old: Value },
    Updated,
    Appended { count: usize, direct: bool },
}

/// Coalesced, not yet delivered changes of one property
struct Pending {
    node: Rc<Node>,
    property: String,
    old: Value,
    replaced: bool,
    updated: bool,
    appended_direct: usize,
    appended_nested: usize,
}

impl Pending {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Replaced { .. } => self.replaced = true,
            Effect::Updated => self.updated = true,
            Effect::Appended {
                count,
                direct: true,
            } => self.appended_direct += count,
            Effect::Appended {
                count,
                direct: false,
            } => self.appended_nested += count,
        }
    }

    /// The kind a registration gets to see, if any.
    ///
    /// Appends to a list held directly by the property always count; anything
    /// deeper only reaches observers that asked for subproperties.
    fn kind_for(&self, include_subproperties: bool) -> Option<ChangeKind> {
        if self.replaced {
            return Some(ChangeKind::Replaced);
        }
        if include_subproperties {
            if self.updated {
                return Some(ChangeKind::Updated);
            }
            let appended = self.appended_direct + self.appended_nested;
            (appended > 0).then_some(ChangeKind::Appended(appended))
        } else {
            (self.appended_direct > 0).then_some(ChangeKind::Appended(self.appended_direct))
        }
    }
}

pub(crate) struct Inner {
    scheduler: Rc<dyn Scheduler>,
    next_observer_id: Cell<u64>,
    registrations: RefCell<Vec<Registration>>,
    pending: RefCell<Vec<Pending>>,
    flush_scheduled: Cell<bool>,
}

impl Inner {
    fn has_observers(&self, node: NodeId) -> bool {
        self.registrations.borrow().iter().any(|r| r.node == node)
    }

    /// Record an effect on `node[property]` and make sure a flush is scheduled.
    pub(crate) fn enqueue(self: &Rc<Self>, node: &Rc<Node>, property: &str, effect: Effect) {
        if !self.has_observers(node.id()) {
            return;
        }
        {
            let mut pending = self.pending.borrow_mut();
            match pending
                .iter_mut()
                .find(|p| p.node.id() == node.id() && p.property == property)
            {
                Some(entry) => entry.apply(effect),
                None => {
                    let old = match &effect {
                        Effect::Replaced { old } => old.clone(),
                        _ => node.get(property),
                    };
                    let mut entry = Pending {
                        node: Rc::clone(node),
                        property: property.to_string(),
                        old,
                        replaced: false,
                        updated: false,
                        appended_direct: 0,
                        appended_nested: 0,
                    };
                    entry.apply(effect);
                    pending.push(entry);
                }
            }
        }
        self.schedule_flush();
    }

    /// Report a mutation of `node` to every record holding it, transitively.
    ///
    /// Record parents one level up receive `first`, everything above `rest`.
    pub(crate) fn bubble(self: &Rc<Self>, node: &Rc<Node>, first: Effect, rest: Effect) {
        let mut visited = vec![node.id()];
        self.bubble_from(node, first, rest, &mut visited);
    }

    fn bubble_from(
        self: &Rc<Self>,
        node: &Rc<Node>,
        effect: Effect,
        rest: Effect,
        visited: &mut Vec<NodeId>,
    ) {
        for (parent, key) in node.parents() {
            if parent.is_record() {
                self.enqueue(&parent, &key, effect.clone());
            }
            if !visited.contains(&parent.id()) {
                visited.push(parent.id());
                self.bubble_from(&parent, rest.clone(), rest.clone(), visited);
            }
        }
    }

    /// Drop a pending notification, used by silent writes.
    pub(crate) fn discard(&self, node: &Rc<Node>, property: &str) {
        self.pending
            .borrow_mut()
            .retain(|p| !(p.node.id() == node.id() && p.property == property));
    }

    fn schedule_flush(self: &Rc<Self>) {
        if self.flush_scheduled.replace(true) {
            return;
        }
        let weak = Rc::downgrade(self);
        self.scheduler.schedule(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Notifier::from_inner(inner).flush();
            }
        }));
    }

    fn is_registered(&self, id: ObserverId) -> bool {
        self.registrations.borrow().iter().any(|r| r.id == id)
    }
}

/// The observation hub.
///
/// Records and lists created from a notifier report their mutations to it;
/// it keeps the registrations and delivers coalesced notifications on the
/// next turn of its [`Scheduler`].
#[derive(Clone)]
pub struct Notifier {
    inner: Rc<Inner>,
}

impl Notifier {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                next_observer_id: Cell::new(1),
                registrations: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
                flush_scheduled: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<Inner> {
        &self.inner
    }

    /// The scheduler notifications are delivered on
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.inner.scheduler)
    }

    /// Create an empty observed record.
    pub fn record(&self) -> Target {
        Target::new(self)
    }

    /// Create an empty observed list.
    pub fn list(&self) -> List {
        List::new(self)
    }

    /// Run `callback` whenever `target[property]` is reassigned, or a list it
    /// holds directly gets new elements.
    ///
    /// `property` may be [`WILDCARD`] to watch every property of `target`.
    pub fn observe<F>(&self, target: &Target, property: &str, callback: F) -> ObserverId
    where
        F: Fn(&Change) + 'static,
    {
        self.register(target, property, false, Rc::new(callback))
    }

    /// Like [`observe`](Self::observe), but mutations anywhere inside the
    /// value held by the property are reported as well, under `property`.
    pub fn observe_nested<F>(&self, target: &Target, property: &str, callback: F) -> ObserverId
    where
        F: Fn(&Change) + 'static,
    {
        self.register(target, property, true, Rc::new(callback))
    }

    fn register(
        &self,
        target: &Target,
        property: &str,
        include_subproperties: bool,
        callback: Callback,
    ) -> ObserverId {
        let id = ObserverId(self.inner.next_observer_id.get());
        self.inner.next_observer_id.set(id.0 + 1);
        trace!(
            "observe {:?}.{} (nested: {}) as {:?}",
            target,
            property,
            include_subproperties,
            id
        );
        self.inner.registrations.borrow_mut().push(Registration {
            id,
            node: target.node().id(),
            property: property.to_string(),
            include_subproperties,
            callback,
        });
        id
    }

    /// Assign `target[property]` without notifying any of its observers.
    pub fn set_silently(&self, target: &Target, property: &str, value: impl Into<Value>) {
        target.write(property, value.into(), false);
    }

    /// Remove a single registration. Returns false if it was already gone.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut registrations = self.inner.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Remove every registration on `target`. Safe to call repeatedly.
    pub fn unobserve_all(&self, target: &Target) {
        let node = target.node().id();
        self.inner
            .registrations
            .borrow_mut()
            .retain(|r| r.node != node);
    }

    /// Number of registrations on `target`
    pub fn observer_count(&self, target: &Target) -> usize {
        let node = target.node().id();
        self.inner
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.node == node)
            .count()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }

    /// Deliver everything pending right now.
    ///
    /// Runs automatically on the scheduler; tests and shutdown paths may call
    /// it directly. Mutations made by callbacks are delivered on a later turn.
    pub fn flush(&self) {
        self.inner.flush_scheduled.set(false);
        let batch = std::mem::take(&mut *self.inner.pending.borrow_mut());

        for entry in batch {
            // A burst ending on its starting value is still delivered
            let value = entry.node.get(&entry.property);

            let deliveries: Vec<(ObserverId, Callback, ChangeKind)> = self
                .inner
                .registrations
                .borrow()
                .iter()
                .filter(|r| r.matches(entry.node.id(), &entry.property))
                .filter_map(|r| {
                    entry
                        .kind_for(r.include_subproperties)
                        .map(|kind| (r.id, Rc::clone(&r.callback), kind))
                })
                .collect();

            for (id, callback, kind) in deliveries {
                // An earlier callback may have unregistered this one
                if !self.inner.is_registered(id) {
                    continue;
                }
                callback(&Change {
                    property: entry.property.clone(),
                    kind,
                    value: value.clone(),
                    old: entry.old.clone(),
                });
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("registrations", &self.inner.registrations.borrow().len())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}
