//! The injected batching hook.
//!
//! A [`Batch`] wraps the host-defined function a [`ListenerRegistry`] routes
//! its notify pass through, so that a burst of triggered callbacks lands in
//! one host-defined unit of work (e.g. one re-render). The default is a
//! pass-through that runs the work directly.
//!
//! [`ListenerRegistry`]: crate::listener::ListenerRegistry

use std::{cell::RefCell, rc::Rc};

/// A batching function: executes the given work immediately and
/// synchronously, but may defer or group any side effects the work triggers
/// until the work completes.
#[derive(Clone)]
pub struct Batch(Rc<dyn Fn(&mut dyn FnMut())>);

impl Batch {
  pub fn new(f: impl Fn(&mut dyn FnMut()) + 'static) -> Self { Batch(Rc::new(f)) }

  /// Run `work` through the batching function.
  #[inline]
  pub fn run(&self, mut work: impl FnMut()) { (self.0)(&mut work) }
}

/// The pass-through batch: calls the work directly.
impl Default for Batch {
  fn default() -> Self { Batch::new(|work| work()) }
}

thread_local! {
  static DEFAULT_BATCH: RefCell<Batch> = RefCell::new(Batch::default());
}

/// Install the batch picked up by registries created on this thread from now
/// on. A host binding calls this once at startup; registries resolve it at
/// collection-creation time, so already-active registries keep the batch
/// they were created with.
pub fn set_default_batch(batch: Batch) {
  DEFAULT_BATCH.with(|b| *b.borrow_mut() = batch);
}

/// The batch currently installed for this thread.
pub fn default_batch() -> Batch { DEFAULT_BATCH.with(|b| b.borrow().clone()) }
