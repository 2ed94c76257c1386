//! Parent-chain trace and descendant-tree reconstruction.
//!
//! `parent_id` is free-form caller input with no referential integrity in
//! storage, so both traversals defend against missing links and cycles:
//! `trace` with a visited set and a hard depth cap, `tree` with per-node
//! duplicate-child elimination plus a traversal-wide visited set. Both
//! check a cancellation token between store calls and stop promptly when
//! the caller has gone away; all traversal here is read-only.

use std::collections::{HashMap, HashSet, VecDeque};

use tokio_util::sync::CancellationToken;

use chronicle_core::{Event, EventNode};

use crate::errors::{Result, StoreError};
use crate::store::EventStore;

/// Upper bound on a parent-chain walk. A longer (or cyclic) chain yields a
/// truncated result rather than an error.
pub const MAX_TRACE_DEPTH: usize = 64;

/// Walk from `event_id` toward the root, following `parent_id` links.
///
/// Returns the chain in child-to-root order: `[self, parent, grandparent,
/// ...]`. The walk ends quietly at the first missing id (a dangling parent
/// link is a chain terminus, not an error), at an id already seen in this
/// walk, at [`MAX_TRACE_DEPTH`], or on cancellation — whatever was
/// collected so far is returned.
pub fn trace(
    store: &EventStore,
    event_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Event>> {
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(event_id.to_owned());

    while let Some(id) = current.take() {
        if cancel.is_cancelled() || chain.len() >= MAX_TRACE_DEPTH || !visited.insert(id.clone())
        {
            break;
        }
        match store.find_by_id(&id) {
            Ok(event) => {
                current = event.parent_id.clone();
                chain.push(event);
            }
            Err(StoreError::NotFound(_)) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(chain)
}

/// Reconstruct the tree of all descendants of `root_id`, breadth-first.
///
/// Children keep the order the parent-id query returned them in (most
/// recent event time first). A child discovered twice under the same parent
/// is appended once (full record comparison); an id reachable through more
/// than one path is expanded once, so traversal terminates even when parent
/// links form a cycle. Cancellation stops expansion and returns the tree
/// built so far.
///
/// # Errors
///
/// [`StoreError::NotFound`] when `root_id` itself does not exist.
pub fn tree(
    store: &EventStore,
    root_id: &str,
    cancel: &CancellationToken,
) -> Result<EventNode> {
    let root = store.find_by_id(root_id)?;

    let mut children_of: HashMap<String, Vec<Event>> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::from([root.id.as_str().to_owned()]);
    let mut queue: VecDeque<String> = VecDeque::from([root.id.as_str().to_owned()]);

    while let Some(id) = queue.pop_front() {
        if cancel.is_cancelled() {
            break;
        }
        let mut children: Vec<Event> = Vec::new();
        for child in store.find_by_parent_id(&id)? {
            let child = child?;
            if children.contains(&child) {
                continue;
            }
            if visited.insert(child.id.as_str().to_owned()) {
                queue.push_back(child.id.as_str().to_owned());
                children.push(child);
            }
        }
        let _ = children_of.insert(id, children);
    }

    Ok(attach(root, &mut children_of))
}

fn attach(event: Event, children_of: &mut HashMap<String, Vec<Event>>) -> EventNode {
    let children = children_of
        .remove(event.id.as_str())
        .unwrap_or_default();
    EventNode {
        event,
        children: children
            .into_iter()
            .map(|child| attach(child, children_of))
            .collect(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
