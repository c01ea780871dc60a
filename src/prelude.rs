//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Batching hook
pub use crate::batch::{default_batch, set_default_batch, Batch};
// Listener registry
pub use crate::listener::{Listener, ListenerRegistry, ListenerSubscription};
// Subscription tree
pub use crate::node::{SubscriptionNode, WeakSubscriptionNode};
// Root source contract
pub use crate::source::{ChangeSource, StateSource};
// Reference store
pub use crate::store::Store;
// Detachment vocabulary
pub use crate::subscription::{CompositeSubscription, Subscription, SubscriptionGuard};
