//! # subcast: Hierarchical Store Subscriptions
//!
//! Propagates "state changed" notifications from a single root source
//! through a dynamically-built tree of observers, guaranteeing ancestors
//! are notified strictly before their descendants, with cheap, leak-free
//! registration that stays safe while a notification pass is running.
//!
//! ## Quick Start
//!
//! ```rust
//! use subcast::prelude::*;
//!
//! let store = Store::new(0);
//!
//! // The root anchor fans every store change out to its children.
//! let root = SubscriptionNode::rooted(store.clone());
//! root.forward_to_nested();
//!
//! // A nested observer: runs after its ancestors, then decides whether
//! // the cascade continues below it.
//! let child = SubscriptionNode::nested(&root);
//! let down = child.downgrade();
//! child.set_on_state_change(move || {
//!   // ...react to the change, then:
//!   if let Some(node) = down.upgrade() {
//!     node.notify_nested_subs();
//!   }
//! });
//! child.activate();
//!
//! store.set(1); // child's handler runs here, after the root's
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ListenerRegistry`] | Ordered callback chain: O(1) add/remove, batched notify |
//! | [`SubscriptionNode`] | Tree node linking an upstream notifier to child listeners |
//! | [`ChangeSource`] / [`StateSource`] | What a root source must provide |
//! | [`Batch`] | Host-injected batching of a notify pass's side effects |
//! | [`Subscription`] | Idempotent detachment handle, with an RAII guard |
//!
//! Everything is single-threaded and synchronous: a change event and the
//! whole cascade it triggers run on the thread that mutated the state.
//!
//! [`ListenerRegistry`]: listener::ListenerRegistry
//! [`SubscriptionNode`]: node::SubscriptionNode
//! [`ChangeSource`]: source::ChangeSource
//! [`StateSource`]: source::StateSource
//! [`Batch`]: batch::Batch
//! [`Subscription`]: subscription::Subscription

pub mod batch;
pub mod listener;
pub mod node;
pub mod prelude;
pub mod source;
pub mod store;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
