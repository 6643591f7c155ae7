//! Observed records and lists
//!
//! [`Target`] and [`List`] are cheap handles over a shared node. Cloning a
//! handle never re-wraps the data: every clone is the same observed object,
//! and `ptr_eq` tells handles apart.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::notifier::{Effect, Inner, Notifier};
use super::value::Value;

/// Process-wide node identity
pub(crate) type NodeId = u64;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Link from a container to the property (or list slot) holding it
struct ParentLink {
    node: Weak<Node>,
    key: String,
}

pub(crate) enum NodeData {
    Record(HashMap<String, Value>),
    List(Vec<Value>),
}

/// Shared state behind a [`Target`] or [`List`] handle
pub(crate) struct Node {
    id: NodeId,
    notifier: Weak<Inner>,
    parents: RefCell<Vec<ParentLink>>,
    data: RefCell<NodeData>,
}

impl Node {
    fn new(notifier: &Notifier, data: NodeData) -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            notifier: Rc::downgrade(notifier.inner()),
            parents: RefCell::new(Vec::new()),
            data: RefCell::new(data),
        })
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn is_record(&self) -> bool {
        matches!(&*self.data.borrow(), NodeData::Record(_))
    }

    pub(crate) fn get(&self, key: &str) -> Value {
        match &*self.data.borrow() {
            NodeData::Record(props) => props.get(key).cloned().unwrap_or_default(),
            NodeData::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
        }
    }

    /// Record `parent[key]` as a holder of this node. Linking twice is a no-op.
    fn link(&self, parent: &Rc<Node>, key: &str) {
        let mut parents = self.parents.borrow_mut();
        parents.retain(|link| link.node.strong_count() > 0);
        let exists = parents
            .iter()
            .any(|link| link.key == key && link.node.upgrade().is_some_and(|p| p.id == parent.id));
        if !exists {
            parents.push(ParentLink {
                node: Rc::downgrade(parent),
                key: key.to_string(),
            });
        }
    }

    fn unlink(&self, parent: NodeId, key: &str) {
        self.parents.borrow_mut().retain(|link| {
            link.key != key || link.node.upgrade().map_or(false, |p| p.id != parent)
        });
    }

    /// Live (parent, key) pairs, collected so no borrow outlives the call
    pub(crate) fn parents(&self) -> Vec<(Rc<Node>, String)> {
        self.parents
            .borrow()
            .iter()
            .filter_map(|link| link.node.upgrade().map(|node| (node, link.key.clone())))
            .collect()
    }

    fn notifier(&self) -> Option<Rc<Inner>> {
        self.notifier.upgrade()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target
// ─────────────────────────────────────────────────────────────────────────────

/// An observed record of named properties.
#[derive(Clone)]
pub struct Target {
    node: Rc<Node>,
}

impl Target {
    /// Create an empty record bound to `notifier`.
    pub fn new(notifier: &Notifier) -> Self {
        Self {
            node: Node::new(notifier, NodeData::Record(HashMap::new())),
        }
    }

    pub(crate) fn node(&self) -> &Rc<Node> {
        &self.node
    }

    /// Read a property. Missing properties read as [`Value::Null`].
    pub fn get(&self, property: &str) -> Value {
        self.node.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        match &*self.node.data.borrow() {
            NodeData::Record(props) => props.contains_key(property),
            NodeData::List(_) => false,
        }
    }

    /// Assign a property and schedule notification of its observers.
    ///
    /// Assigning a value equal to the current one does nothing.
    pub fn set(&self, property: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.contains(property) && self.get(property) == value {
            return;
        }
        self.write(property, value, true);
    }

    /// Assign a property, notifying observers only when `notify` is set.
    ///
    /// A silent write also drops any notification still pending for the
    /// property, so the written value becomes the new baseline.
    pub(crate) fn write(&self, property: &str, value: Value, notify: bool) {
        if let Some(child) = value.node() {
            child.link(&self.node, property);
        }
        let previous = match &mut *self.node.data.borrow_mut() {
            NodeData::Record(props) => props.insert(property.to_string(), value.clone()),
            NodeData::List(_) => None,
        };
        let old = previous.unwrap_or_default();

        // The same container may be re-assigned to the same property
        if let Some(old_child) = old.node() {
            if value.node().map_or(true, |new| new.id() != old_child.id()) {
                old_child.unlink(self.node.id(), property);
            }
        }

        let Some(inner) = self.node.notifier() else {
            return;
        };
        if notify {
            inner.enqueue(&self.node, property, Effect::Replaced { old });
            inner.bubble(&self.node, Effect::Updated, Effect::Updated);
        } else {
            inner.discard(&self.node, property);
        }
    }

    /// The notifier this record reports to, while it is alive
    pub fn notifier(&self) -> Option<Notifier> {
        self.node.notifier().map(Notifier::from_inner)
    }

    /// True if both handles refer to the same observed record.
    pub fn ptr_eq(&self, other: &Target) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target").field("id", &self.node.id()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

/// An observed ordered collection. Appends are reported to the observers of
/// the property holding the list.
#[derive(Clone)]
pub struct List {
    node: Rc<Node>,
}

impl List {
    pub fn new(notifier: &Notifier) -> Self {
        Self {
            node: Node::new(notifier, NodeData::List(Vec::new())),
        }
    }

    /// Build a list from existing values without notifying anyone.
    pub fn from_values(notifier: &Notifier, values: impl IntoIterator<Item = Value>) -> Self {
        let list = Self::new(notifier);
        for value in values {
            list.insert(value);
        }
        list
    }

    pub(crate) fn node(&self) -> &Rc<Node> {
        &self.node
    }

    pub fn len(&self) -> usize {
        match &*self.node.data.borrow() {
            NodeData::List(items) => items.len(),
            NodeData::Record(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match &*self.node.data.borrow() {
            NodeData::List(items) => items.get(index).cloned(),
            NodeData::Record(_) => None,
        }
    }

    pub fn last(&self) -> Option<Value> {
        match &*self.node.data.borrow() {
            NodeData::List(items) => items.last().cloned(),
            NodeData::Record(_) => None,
        }
    }

    /// Snapshot of the current elements
    pub fn to_vec(&self) -> Vec<Value> {
        match &*self.node.data.borrow() {
            NodeData::List(items) => items.clone(),
            NodeData::Record(_) => Vec::new(),
        }
    }

    /// Append one element.
    pub fn push(&self, value: impl Into<Value>) {
        self.insert(value.into());
        self.appended(1);
    }

    /// Append several elements as a single change.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        let mut count = 0;
        for value in values {
            self.insert(value);
            count += 1;
        }
        if count > 0 {
            self.appended(count);
        }
    }

    fn insert(&self, value: Value) {
        let index = self.len();
        if let Some(child) = value.node() {
            child.link(&self.node, &index.to_string());
        }
        if let NodeData::List(items) = &mut *self.node.data.borrow_mut() {
            items.push(value);
        }
    }

    fn appended(&self, count: usize) {
        if let Some(inner) = self.node.notifier() {
            inner.bubble(
                &self.node,
                Effect::Appended {
                    count,
                    direct: true,
                },
                Effect::Appended {
                    count,
                    direct: false,
                },
            );
        }
    }

    /// True if both handles refer to the same observed list.
    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("id", &self.node.id())
            .field("len", &self.len())
            .finish()
    }
}
