//! Ordered listener registries.
//!
//! A [`ListenerRegistry`] is an insertion-ordered collection of callbacks
//! with O(1) subscribe, O(1) remove-by-handle, and an O(n) notify pass that
//! runs inside one call to the injected [`Batch`]. The sequence may be
//! mutated freely while a notify pass is iterating it.

use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use crate::{
  batch::{default_batch, Batch},
  subscription::Subscription,
};

/// A registered callback, as stored and handed back by a registry.
pub type Listener = Rc<dyn Fn()>;

type EntryRc = Rc<RefCell<ListenerEntry>>;
type EntryWeak = Weak<RefCell<ListenerEntry>>;

/// One link of the listener chain.
///
/// Ownership runs forward: `next` is strong, `prev` is weak. An entry
/// spliced out of the chain keeps its own links so a notify pass currently
/// standing on it can still walk into the live remainder of the chain.
struct ListenerEntry {
  callback: Listener,
  prev: Option<EntryWeak>,
  next: Option<EntryRc>,
  epoch: u64,
}

impl Drop for ListenerEntry {
  fn drop(&mut self) {
    // Unwind the owned tail iteratively; dropping a long chain through the
    // default recursive drop would overflow the stack.
    let mut next = self.next.take();
    while let Some(entry) = next {
      next = match Rc::try_unwrap(entry) {
        Ok(cell) => cell.into_inner().next.take(),
        // Still referenced elsewhere (e.g. a notify pass standing on it);
        // whoever holds it unwinds the rest later.
        Err(_) => None,
      };
    }
  }
}

/// Shared head/tail of the chain. `first == None` iff the chain is empty.
///
/// The epoch is bumped by `clear()`; a detachment handle whose entry carries
/// an older epoch must not splice itself into a chain rebuilt afterwards.
#[derive(Default)]
struct Links {
  first: Option<EntryRc>,
  last: Option<EntryWeak>,
  epoch: u64,
}

/// An insertion-ordered collection of `Fn()` callbacks.
///
/// Cloning is cheap and shares the underlying chain, so a registry handle
/// can be passed around the same way the callbacks it notifies are.
#[derive(Clone)]
pub struct ListenerRegistry {
  links: Rc<RefCell<Links>>,
  batch: Batch,
}

impl Default for ListenerRegistry {
  fn default() -> Self { Self::new() }
}

impl ListenerRegistry {
  /// Creates an empty registry using the thread's current default batch
  /// (see [`set_default_batch`](crate::batch::set_default_batch)).
  pub fn new() -> Self { Self::with_batch(default_batch()) }

  /// Creates an empty registry notifying through the given batch.
  pub fn with_batch(batch: Batch) -> Self {
    ListenerRegistry { links: Rc::new(RefCell::new(Links::default())), batch }
  }

  /// Appends `callback` at the tail of the chain and returns the detachment
  /// handle bound to that exact registration.
  ///
  /// Safe to call while a notify pass is running; see [`notify`] for how
  /// the pass treats entries added mid-iteration.
  ///
  /// [`notify`]: ListenerRegistry::notify
  pub fn subscribe(&self, callback: impl Fn() + 'static) -> ListenerSubscription {
    self.subscribe_rc(Rc::new(callback))
  }

  pub(crate) fn subscribe_rc(&self, callback: Listener) -> ListenerSubscription {
    let mut links = self.links.borrow_mut();
    let entry = Rc::new(RefCell::new(ListenerEntry {
      callback,
      prev: links.last.clone(),
      next: None,
      epoch: links.epoch,
    }));

    if let Some(prev) = links.last.as_ref().and_then(Weak::upgrade) {
      prev.borrow_mut().next = Some(Rc::clone(&entry));
    } else {
      links.first = Some(Rc::clone(&entry));
    }
    links.last = Some(Rc::downgrade(&entry));

    ListenerSubscription {
      closed: false,
      entry: Rc::downgrade(&entry),
      links: Rc::clone(&self.links),
    }
  }

  /// Invokes every currently-linked callback in subscribe order, inside
  /// exactly one call to the batching function.
  ///
  /// The pass follows live links: a callback detached mid-pass before its
  /// turn is skipped, and a callback subscribed mid-pass lands at the tail
  /// of the chain being walked, so the running pass reaches it too (unless
  /// the entry the pass is standing on was itself just detached, whose
  /// stale links no longer lead to the new tail). A panicking callback
  /// aborts the remainder of the pass.
  pub fn notify(&self) {
    let first = self.links.borrow().first.clone();
    self.batch.run(|| {
      let mut cursor = first.clone();
      while let Some(entry) = cursor {
        // Borrows on the entry are released before the callback runs, so
        // the callback may subscribe or unsubscribe anything, including
        // its own registration.
        let callback = Rc::clone(&entry.borrow().callback);
        (*callback)();
        cursor = entry.borrow().next.clone();
      }
    });
  }

  /// An ordered snapshot of the currently-linked callbacks.
  pub fn get(&self) -> Vec<Listener> {
    let mut listeners = Vec::new();
    let mut cursor = self.links.borrow().first.clone();
    while let Some(entry) = cursor {
      let entry = entry.borrow();
      listeners.push(Rc::clone(&entry.callback));
      cursor = entry.next.clone();
    }
    listeners
  }

  /// Number of currently-linked callbacks (counted walk).
  pub fn len(&self) -> usize {
    let mut len = 0;
    let mut cursor = self.links.borrow().first.clone();
    while let Some(entry) = cursor {
      len += 1;
      cursor = entry.borrow().next.clone();
    }
    len
  }

  #[inline]
  pub fn is_empty(&self) -> bool { self.links.borrow().first.is_none() }

  /// Resets the registry to empty in O(1) by discarding the head and tail
  /// of the chain. Outstanding detachment handles are not invoked; they
  /// become no-ops through their own guard.
  pub fn clear(&self) {
    let mut links = self.links.borrow_mut();
    links.first = None;
    links.last = None;
    links.epoch += 1;
  }
}

impl Debug for ListenerRegistry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ListenerRegistry")
      .field("len", &self.len())
      .finish()
  }
}

/// Detachment handle returned by [`ListenerRegistry::subscribe`].
///
/// Splices its entry out of the chain in O(1). Idempotent: a second
/// `unsubscribe`, or one arriving after the registry was cleared, is a safe
/// no-op. Dropping the handle does NOT detach the callback.
pub struct ListenerSubscription {
  closed: bool,
  entry: EntryWeak,
  links: Rc<RefCell<Links>>,
}

impl Subscription for ListenerSubscription {
  fn unsubscribe(&mut self) {
    if self.closed {
      return;
    }
    self.closed = true;

    let Some(entry) = self.entry.upgrade() else { return };
    let mut links = self.links.borrow_mut();
    let entry = entry.borrow();
    if entry.epoch != links.epoch {
      // The chain this entry belonged to was cleared; splicing now would
      // corrupt whatever chain replaced it.
      return;
    }

    // Rewire the neighbors and the boundary references. The removed
    // entry's own links stay intact for any pass standing on it.
    let prev = entry.prev.as_ref().and_then(Weak::upgrade);
    if let Some(next) = &entry.next {
      next.borrow_mut().prev = entry.prev.clone();
    } else {
      links.last = entry.prev.clone();
    }
    if let Some(prev) = prev {
      prev.borrow_mut().next = entry.next.clone();
    } else {
      links.first = entry.next.clone();
    }
  }

  fn is_closed(&self) -> bool { self.closed || self.entry.strong_count() == 0 }
}

impl Debug for ListenerSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ListenerSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// Registry stand-in held by an inactive subscription node, so callers can
/// fan out notifications without null-checking the node's state first.
/// Clones share the live chain, like the registry itself.
#[derive(Clone)]
pub(crate) enum NestedListeners {
  Null,
  Live(ListenerRegistry),
}

impl NestedListeners {
  pub(crate) fn notify(&self) {
    if let NestedListeners::Live(registry) = self {
      registry.notify();
    }
  }

  pub(crate) fn clear(&self) {
    if let NestedListeners::Live(registry) = self {
      registry.clear();
    }
  }
}
