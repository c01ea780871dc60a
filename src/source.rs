//! The root source contract.
//!
//! A [`SubscriptionNode`](crate::node::SubscriptionNode) without a parent
//! attaches to whatever produces the change events: anything implementing
//! [`ChangeSource`]. The core only ever registers and detaches callbacks;
//! reading state snapshots is the host's business, expressed by the
//! [`StateSource`] extension.

use std::rc::Rc;

use crate::{listener::Listener, subscription::Subscription};

/// Something that fires a zero-argument callback on every state change.
pub trait ChangeSource {
  /// Register `callback` to run after every change; the returned handle
  /// detaches it (idempotently).
  fn subscribe(&self, callback: Listener) -> Box<dyn Subscription>;
}

impl<T: ChangeSource + ?Sized> ChangeSource for Rc<T> {
  #[inline]
  fn subscribe(&self, callback: Listener) -> Box<dyn Subscription> {
    (**self).subscribe(callback)
  }
}

/// A [`ChangeSource`] with a synchronously readable state snapshot.
///
/// The subscription core never inspects `State`; the associated type exists
/// for hosts that select or derive from it.
pub trait StateSource: ChangeSource {
  type State;

  fn get_state(&self) -> Self::State;
}
