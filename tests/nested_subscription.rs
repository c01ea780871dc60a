//! Integration tests for the subscription tree.
//!
//! Exercises full cascades from a store through nested nodes: ordering,
//! gating, detachment mid-cascade, and batching.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use subcast::prelude::*;

type EventLog = Rc<RefCell<Vec<String>>>;

fn log_handler(log: &EventLog, tag: &str) -> impl Fn() + 'static {
  let log = log.clone();
  let tag = tag.to_owned();
  move || log.borrow_mut().push(tag.clone())
}

#[test]
fn root_change_reaches_child_only_when_parent_forwards() {
  let store = Store::new(0);
  let log: EventLog = Rc::new(RefCell::new(Vec::new()));

  let a = SubscriptionNode::rooted(store.clone());
  let b = SubscriptionNode::nested(&a);

  // A's update routine: do its own work, then continue the cascade.
  let log_a = log.clone();
  let a_down = a.downgrade();
  let observed = store.clone();
  a.set_on_state_change(move || {
    log_a.borrow_mut().push(format!("a saw {}", observed.get_state()));
    if let Some(a) = a_down.upgrade() {
      a.notify_nested_subs();
    }
  });
  a.activate();

  b.set_on_state_change(log_handler(&log, "b"));
  b.activate();

  store.set(1);
  assert_eq!(*log.borrow(), vec!["a saw 1", "b"]);

  // Re-wire A to swallow the event; B must stay silent.
  let log_a = log.clone();
  a.set_on_state_change(move || log_a.borrow_mut().push("a only".into()));
  store.set(2);
  assert_eq!(*log.borrow(), vec!["a saw 1", "b", "a only"]);
}

#[test]
fn cascade_is_strictly_ancestor_before_descendant() {
  let store = Store::new(0);
  let log: EventLog = Rc::new(RefCell::new(Vec::new()));

  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  // A chain of depth 5; every node reports its depth and forwards.
  let mut chain = vec![root];
  for depth in 1..=5 {
    let parent = &chain[chain.len() - 1];
    let node = SubscriptionNode::nested(parent);
    let log_node = log.clone();
    let down = node.downgrade();
    node.set_on_state_change(move || {
      log_node.borrow_mut().push(format!("depth {depth}"));
      if let Some(node) = down.upgrade() {
        node.notify_nested_subs();
      }
    });
    node.activate();
    chain.push(node);
  }

  store.set(1);
  assert_eq!(
    *log.borrow(),
    vec!["depth 1", "depth 2", "depth 3", "depth 4", "depth 5"]
  );
}

#[test]
fn siblings_run_in_subscribe_order_after_each_branch_finishes() {
  let store = Store::new(0);
  let log: EventLog = Rc::new(RefCell::new(Vec::new()));

  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let a = SubscriptionNode::nested(&root);
  let log_a = log.clone();
  let a_down = a.downgrade();
  a.set_on_state_change(move || {
    log_a.borrow_mut().push("a".into());
    if let Some(a) = a_down.upgrade() {
      a.notify_nested_subs();
    }
  });
  a.activate();

  let a1 = SubscriptionNode::nested(&a);
  a1.set_on_state_change(log_handler(&log, "a1"));
  a1.activate();

  let b = SubscriptionNode::nested(&root);
  b.set_on_state_change(log_handler(&log, "b"));
  b.activate();

  // Depth-first: A's whole branch drains before sibling B runs.
  store.set(1);
  assert_eq!(*log.borrow(), vec!["a", "a1", "b"]);
}

#[test]
fn deactivating_a_sibling_mid_cascade_skips_it() {
  let store = Store::new(0);
  let log: EventLog = Rc::new(RefCell::new(Vec::new()));

  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let b = SubscriptionNode::nested(&root);
  let c = SubscriptionNode::nested(&root);

  let log_b = log.clone();
  let c_to_kill = c.clone();
  b.set_on_state_change(move || {
    log_b.borrow_mut().push("b".into());
    c_to_kill.deactivate();
  });
  b.activate();

  c.set_on_state_change(log_handler(&log, "c"));
  c.activate();

  // B detaches C before C's turn in the same pass.
  store.set(1);
  assert_eq!(*log.borrow(), vec!["b"]);
  assert!(!c.is_active());
}

#[test]
fn one_batch_per_notify_pass_across_the_cascade() {
  let batches = Rc::new(Cell::new(0));
  let batches_in = batches.clone();
  set_default_batch(Batch::new(move |work| {
    batches_in.set(batches_in.get() + 1);
    work();
  }));

  let store = Store::new(0);
  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let calls = Rc::new(Cell::new(0));
  let mut leaves = Vec::new();
  for _ in 0..3 {
    let calls = calls.clone();
    let leaf = SubscriptionNode::nested(&root);
    leaf.set_on_state_change(move || calls.set(calls.get() + 1));
    leaf.activate();
    leaves.push(leaf);
  }

  store.set(1);
  // One pass through the store's registry plus one through the root's,
  // regardless of how many listeners each pass visits.
  assert_eq!(batches.get(), 2);
  assert_eq!(calls.get(), 3);

  set_default_batch(Batch::default());
}

#[test]
fn guard_detaches_nested_sub_when_scope_ends() {
  let store = Store::new(0);
  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let count = Rc::new(Cell::new(0));
  {
    let count = count.clone();
    let _guard = root.add_nested_sub(move || count.set(count.get() + 1)).guard();
    store.set(1);
  }
  store.set(2);
  assert_eq!(count.get(), 1);
}

#[test]
fn composite_tears_down_a_whole_observer_at_once() {
  let store = Store::new(0);
  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let count = Rc::new(Cell::new(0));
  let mut teardown = CompositeSubscription::new();
  for _ in 0..3 {
    let count = count.clone();
    teardown.add(root.add_nested_sub(move || count.set(count.get() + 1)));
  }

  store.set(1);
  assert_eq!(count.get(), 3);

  teardown.unsubscribe();
  store.set(2);
  assert_eq!(count.get(), 3);
}

#[test]
fn handlers_read_a_consistent_snapshot_during_the_cascade() {
  let store = Store::new(10);
  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();

  let leaf = SubscriptionNode::nested(&root);
  let seen = Rc::new(RefCell::new(Vec::new()));
  let seen_in = seen.clone();
  let observed = store.clone();
  leaf.set_on_state_change(move || seen_in.borrow_mut().push(observed.get_state()));
  leaf.activate();

  store.set(11);
  store.update(|v| *v += 1);
  assert_eq!(*seen.borrow(), vec![11, 12]);
}

#[test]
fn full_mount_update_unmount_cycle() {
  // The shape a host framework drives: mount activates, every update calls
  // activate again without tracking prior state, unmount deactivates.
  let store = Store::new(0);
  let root = SubscriptionNode::rooted(store.clone());
  root.forward_to_nested();
  root.activate();

  let count = Rc::new(Cell::new(0));
  let leaf = SubscriptionNode::nested(&root);
  let count_in = count.clone();
  leaf.set_on_state_change(move || count_in.set(count_in.get() + 1));
  leaf.activate();

  for round in 1..=3 {
    leaf.activate(); // update cycle: must be a no-op
    store.set(round);
  }
  assert_eq!(count.get(), 3);

  leaf.deactivate();
  leaf.deactivate(); // unmount twice: still fine
  store.set(99);
  assert_eq!(count.get(), 3);
}
