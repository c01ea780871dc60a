use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

/// Handle to an active registration, allowing it to be detached.
///
/// Detachment is idempotent: calling [`unsubscribe`](Subscription::unsubscribe)
/// a second time is a safe no-op.
pub trait Subscription {
  /// Detach the registration this handle stands for.
  fn unsubscribe(&mut self);

  /// Whether this handle has already been detached.
  fn is_closed(&self) -> bool;

  /// Activates RAII behavior for this subscription: `unsubscribe()` runs
  /// automatically as soon as the returned guard goes out of scope.
  ///
  /// **Attention:** if you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn guard(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(self)
  }
}

impl<T: ?Sized> Subscription for Box<T>
where
  T: Subscription,
{
  #[inline]
  fn unsubscribe(&mut self) {
    let s = &mut **self;
    s.unsubscribe()
  }

  #[inline]
  fn is_closed(&self) -> bool {
    let s = &**self;
    s.is_closed()
  }
}

/// The empty subscription: detaching it does nothing.
impl Subscription for () {
  #[inline]
  fn unsubscribe(&mut self) {}
  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl Debug for Box<dyn Subscription> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn Subscription>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription
/// will be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior
  /// for it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

/// An owned collection of subscriptions detached as one unit.
///
/// Useful for callers that accumulate many detachment handles over time
/// (one per nested registration) and tear them all down at a single point,
/// e.g. when the owning observer goes away. Once closed, handles added
/// later are unsubscribed immediately.
#[derive(Default)]
pub struct CompositeSubscription {
  closed: bool,
  teardown: SmallVec<[Box<dyn Subscription>; 1]>,
}

impl CompositeSubscription {
  #[inline]
  pub fn new() -> Self { Self::default() }

  pub fn add<S: Subscription + 'static>(&mut self, mut subscription: S) {
    if self.closed {
      subscription.unsubscribe();
    } else {
      self.teardown.retain(|s| !s.is_closed());
      self.teardown.push(Box::new(subscription));
    }
  }

  /// Number of handles currently held (closed ones are pruned on `add`).
  #[inline]
  pub fn teardown_size(&self) -> usize { self.teardown.len() }
}

impl Subscription for CompositeSubscription {
  fn unsubscribe(&mut self) {
    if !self.closed {
      self.closed = true;
      for s in &mut self.teardown {
        s.unsubscribe();
      }
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed }
}

impl Debug for CompositeSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CompositeSubscription")
      .field("closed", &self.closed)
      .field("teardown_count", &self.teardown.len())
      .finish()
  }
}
