//! Hierarchical subscription nodes.
//!
//! A [`SubscriptionNode`] mediates between an upstream notifier (the root
//! [`ChangeSource`] or a parent node) and a registry of downstream
//! listeners. Chained via [`add_nested_sub`], nodes form a tree in which a
//! single change event at the root reaches every level strictly
//! ancestor-before-descendant: each node's own handler runs before the node
//! (optionally) fans the event out to its children.
//!
//! One structural type serves both the tree's root anchor and every
//! descendant's attachment point; behavior differs only by what is plugged
//! into the late-bound `on_state_change` slot and by the presence of a
//! parent reference.
//!
//! [`add_nested_sub`]: SubscriptionNode::add_nested_sub

use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use crate::{
  batch::{default_batch, Batch},
  listener::{Listener, ListenerRegistry, ListenerSubscription, NestedListeners},
  source::ChangeSource,
  subscription::Subscription,
};

/// One observer's attachment point in the notification tree.
///
/// Created inactive; the upstream link is established lazily by
/// [`activate`](SubscriptionNode::activate) or by the first
/// [`add_nested_sub`](SubscriptionNode::add_nested_sub). Cloning is cheap
/// and shares the node's state. Dropping the last clone of an active node
/// detaches it from its upstream.
///
/// # Examples
///
/// ```
/// use subcast::prelude::*;
///
/// let store = Store::new(0);
/// let root = SubscriptionNode::rooted(store.clone());
/// // The root anchor forwards every store change straight to its children.
/// root.forward_to_nested();
///
/// let child = SubscriptionNode::nested(&root);
/// child.set_on_state_change(move || {
///   // runs after every ancestor has handled the change
/// });
/// child.activate();
///
/// store.set(1);
/// ```
#[derive(Clone)]
pub struct SubscriptionNode {
  inner: Rc<RefCell<NodeInner>>,
}

struct NodeInner {
  source: Rc<dyn ChangeSource>,
  parent: Option<SubscriptionNode>,
  on_state_change: Option<Listener>,
  upstream: Option<Box<dyn Subscription>>,
  listeners: NestedListeners,
  batch: Option<Batch>,
}

impl Drop for NodeInner {
  fn drop(&mut self) {
    if let Some(mut upstream) = self.upstream.take() {
      upstream.unsubscribe();
    }
  }
}

impl SubscriptionNode {
  /// A node attaching directly to the root source.
  pub fn rooted(source: impl ChangeSource + 'static) -> Self {
    Self::with_parent(Rc::new(source), None)
  }

  /// A node attaching beneath `parent`, sharing its root source.
  pub fn nested(parent: &SubscriptionNode) -> Self {
    let source = Rc::clone(&parent.inner.borrow().source);
    Self::with_parent(source, Some(parent.clone()))
  }

  fn with_parent(source: Rc<dyn ChangeSource>, parent: Option<SubscriptionNode>) -> Self {
    SubscriptionNode {
      inner: Rc::new(RefCell::new(NodeInner {
        source,
        parent,
        on_state_change: None,
        upstream: None,
        listeners: NestedListeners::Null,
        batch: None,
      })),
    }
  }

  /// Pins the batch used for registries this node allocates. Without this,
  /// activation resolves the thread's default batch.
  pub fn with_batch(self, batch: Batch) -> Self {
    self.inner.borrow_mut().batch = Some(batch);
    self
  }

  /// Registers `callback` with this node's child registry, activating the
  /// node first if needed. This is how a child node attaches to its parent,
  /// and how any external observer taps this node's notifications.
  pub fn add_nested_sub(&self, callback: impl Fn() + 'static) -> ListenerSubscription {
    self.add_nested_rc(Rc::new(callback))
  }

  fn add_nested_rc(&self, callback: Listener) -> ListenerSubscription {
    self.ensure_active().subscribe_rc(callback)
  }

  /// Fans the current change event out to this node's children. No-op
  /// while the node is inactive.
  pub fn notify_nested_subs(&self) {
    // Clone the (shared) registry out so no borrow is held while the
    // listeners run.
    let listeners = self.inner.borrow().listeners.clone();
    listeners.notify();
  }

  /// Sets the handler invoked when this node's upstream reports a change.
  ///
  /// At a root anchor this is typically the node's own
  /// [`notify_nested_subs`] (see [`forward_to_nested`]); at a leaf it is the
  /// owning observer's update routine, which finishes its own work and then
  /// decides whether to continue the cascade downward.
  ///
  /// A handler that needs its own node should capture a
  /// [`downgrade`](SubscriptionNode::downgrade)d handle: capturing the node
  /// strongly forms a cycle that only `deactivate` breaks.
  ///
  /// [`notify_nested_subs`]: SubscriptionNode::notify_nested_subs
  /// [`forward_to_nested`]: SubscriptionNode::forward_to_nested
  pub fn set_on_state_change(&self, callback: impl Fn() + 'static) {
    self.inner.borrow_mut().on_state_change = Some(Rc::new(callback));
  }

  /// Clears the `on_state_change` slot; upstream changes become no-ops for
  /// this node until a new handler is set.
  pub fn clear_on_state_change(&self) { self.inner.borrow_mut().on_state_change = None; }

  /// Wires `on_state_change` to this node's own `notify_nested_subs`: every
  /// upstream change is fanned straight out to the children. This is the
  /// root-anchor setup. The slot captures the node weakly, so it never keeps
  /// the node alive on its own.
  pub fn forward_to_nested(&self) {
    let weak = self.downgrade();
    self.inner.borrow_mut().on_state_change = Some(Rc::new(move || {
      if let Some(node) = weak.upgrade() {
        node.notify_nested_subs();
      }
    }));
  }

  /// A non-owning handle to this node, for handlers and other callbacks
  /// that must reach the node without keeping it alive.
  pub fn downgrade(&self) -> WeakSubscriptionNode {
    WeakSubscriptionNode { inner: Rc::downgrade(&self.inner) }
  }

  /// Establishes the upstream link: registers this node's change-handler
  /// with the parent node if one exists, else with the root source, and
  /// allocates a fresh child registry. Idempotent; a second call while
  /// active is a no-op.
  pub fn activate(&self) { self.ensure_active(); }

  /// Tears the upstream link down, clears the child registry and replaces
  /// it with the inert stand-in, and clears `on_state_change`. Idempotent;
  /// calling it on an inactive node is a no-op. The node may be activated
  /// again later.
  pub fn deactivate(&self) {
    let mut upstream = {
      let mut inner = self.inner.borrow_mut();
      let Some(upstream) = inner.upstream.take() else { return };
      inner.listeners.clear();
      inner.listeners = NestedListeners::Null;
      inner.on_state_change = None;
      upstream
    };
    // Detach outside the borrow: for a nested node this touches the
    // parent's registry.
    upstream.unsubscribe();
    log::trace!("subscription node deactivated");
  }

  /// True iff an upstream detachment handle is currently held.
  pub fn is_active(&self) -> bool { self.inner.borrow().upstream.is_some() }

  /// The live child registry, activating the node first if necessary.
  fn ensure_active(&self) -> ListenerRegistry {
    if let NestedListeners::Live(registry) = &self.inner.borrow().listeners {
      return registry.clone();
    }

    let handler = self.change_handler();
    let (parent, source) = {
      let inner = self.inner.borrow();
      (inner.parent.clone(), Rc::clone(&inner.source))
    };
    let is_nested = parent.is_some();
    let upstream: Box<dyn Subscription> = match parent {
      Some(parent) => Box::new(parent.add_nested_rc(handler)),
      None => source.subscribe(handler),
    };
    log::trace!(
      "subscription node activated ({})",
      if is_nested { "nested" } else { "rooted" }
    );

    let mut inner = self.inner.borrow_mut();
    let batch = inner.batch.clone().unwrap_or_else(default_batch);
    let registry = ListenerRegistry::with_batch(batch);
    inner.upstream = Some(upstream);
    inner.listeners = NestedListeners::Live(registry.clone());
    registry
  }

  /// The callback handed to the upstream. Its sole job is to invoke the
  /// current `on_state_change`, if any; the weak capture keeps an upstream
  /// registry from owning the node.
  fn change_handler(&self) -> Listener {
    let weak = Rc::downgrade(&self.inner);
    Rc::new(move || {
      let on_change = weak
        .upgrade()
        .and_then(|inner| inner.borrow().on_state_change.clone());
      if let Some(on_change) = on_change {
        (*on_change)();
      }
    })
  }
}

/// Weak counterpart of [`SubscriptionNode`]; see
/// [`downgrade`](SubscriptionNode::downgrade).
#[derive(Clone)]
pub struct WeakSubscriptionNode {
  inner: Weak<RefCell<NodeInner>>,
}

impl WeakSubscriptionNode {
  /// The node, if any clone of it is still alive.
  pub fn upgrade(&self) -> Option<SubscriptionNode> {
    self.inner.upgrade().map(|inner| SubscriptionNode { inner })
  }
}

impl Debug for SubscriptionNode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionNode")
      .field("is_active", &self.is_active())
      .finish()
  }
}
