//! A minimal single-threaded state container.
//!
//! [`Store`] is the crate's reference [`ChangeSource`]: a current value plus
//! multicast change delivery through an owned
//! [`ListenerRegistry`](crate::listener::ListenerRegistry). It exists so the
//! subscription tree is usable and testable end-to-end without a host
//! framework; any store-like object can stand in by implementing the source
//! traits itself.

use std::{cell::RefCell, rc::Rc};

use crate::{
  listener::{Listener, ListenerRegistry},
  source::{ChangeSource, StateSource},
  subscription::Subscription,
};

/// Holds a value of type `S` and notifies subscribers after every change.
/// Cloning is cheap and shares the underlying state.
pub struct Store<S> {
  inner: Rc<StoreInner<S>>,
}

struct StoreInner<S> {
  state: RefCell<S>,
  listeners: ListenerRegistry,
}

impl<S> Clone for Store<S> {
  #[inline]
  fn clone(&self) -> Self { Store { inner: Rc::clone(&self.inner) } }
}

impl<S: Clone> Store<S> {
  pub fn new(initial: S) -> Self {
    Store {
      inner: Rc::new(StoreInner {
        state: RefCell::new(initial),
        listeners: ListenerRegistry::new(),
      }),
    }
  }

  /// Replaces the state and fires one change event.
  pub fn set(&self, next: S) {
    *self.inner.state.borrow_mut() = next;
    log::trace!("store state replaced; notifying subscribers");
    self.inner.listeners.notify();
  }

  /// Mutates the state in place and fires one change event.
  pub fn update(&self, f: impl FnOnce(&mut S)) {
    f(&mut self.inner.state.borrow_mut());
    log::trace!("store state updated; notifying subscribers");
    self.inner.listeners.notify();
  }
}

impl<S> ChangeSource for Store<S> {
  fn subscribe(&self, callback: Listener) -> Box<dyn Subscription> {
    Box::new(self.inner.listeners.subscribe_rc(callback))
  }
}

impl<S: Clone> StateSource for Store<S> {
  type State = S;

  fn get_state(&self) -> S { self.inner.state.borrow().clone() }
}
