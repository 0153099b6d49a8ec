/// Comment threads: reply-tree construction and cascading delete resolution
///
/// Both work on an arena (the input vector) plus an adjacency map from
/// parent id to child indices, built once per call. Descent is iterative, so
/// thread depth is bounded only by memory.
use crate::error::{AppError, Result};
use crate::models::{Comment, Record};
use crate::services::enrichment::Enriched;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Records that may reply to another record of the same kind
pub trait Threaded: Record {
    fn parent_id(&self) -> Option<Uuid>;
}

impl Threaded for Comment {
    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
}

impl<T: Threaded> Threaded for Enriched<T> {
    fn parent_id(&self) -> Option<Uuid> {
        self.record.parent_id()
    }
}

/// A record with its direct replies, newest first
#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub replies: Vec<ThreadNode<T>>,
}

impl<T> ThreadNode<T> {
    /// Nodes in this subtree, self included
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(ThreadNode::size).sum::<usize>()
    }
}

/// parent id → child indices, each list newest first
fn child_index<T: Threaded>(items: &[T]) -> HashMap<Option<Uuid>, Vec<usize>> {
    let mut children: HashMap<Option<Uuid>, Vec<usize>> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        children.entry(item.parent_id()).or_default().push(idx);
    }
    for list in children.values_mut() {
        list.sort_by(|&a, &b| items[b].created_at().cmp(&items[a].created_at()));
    }
    children
}

/// Fails if any parent chain loops, reachable from a root or not.
fn ensure_acyclic<T: Threaded>(items: &[T]) -> Result<()> {
    let parent_of: HashMap<Uuid, Option<Uuid>> =
        items.iter().map(|item| (item.id(), item.parent_id())).collect();
    let mut settled: HashSet<Uuid> = HashSet::with_capacity(parent_of.len());

    for &start in parent_of.keys() {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if settled.contains(&id) {
                break;
            }
            if !on_path.insert(id) {
                return Err(AppError::CycleDetected(id));
            }
            path.push(id);
            // a parent outside the set ends the chain
            current = parent_of.get(&id).copied().flatten();
        }
        settled.extend(path);
    }
    Ok(())
}

/// Build the reply forest for one post's comments.
///
/// Roots are records without a parent, newest first; every node's replies
/// are its direct children, newest first. Records whose parent is not in
/// `items` are unreachable and left out.
pub fn build_forest<T: Threaded>(items: Vec<T>) -> Result<Vec<ThreadNode<T>>> {
    ensure_acyclic(&items)?;

    let ids: Vec<Uuid> = items.iter().map(Record::id).collect();
    let children = child_index(&items);
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Option<ThreadNode<T>>> = (0..slots.len()).map(|_| None).collect();
    let mut visited: HashSet<Uuid> = HashSet::with_capacity(ids.len());

    let no_children = Vec::new();
    let kids = |idx: usize| children.get(&Some(ids[idx])).unwrap_or(&no_children);
    let roots = children.get(&None).cloned().unwrap_or_default();

    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        let mut stack = vec![(root, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                let replies = kids(idx)
                    .iter()
                    .filter_map(|&child| built[child].take())
                    .collect();
                let item = slots[idx].take().ok_or_else(|| {
                    AppError::Internal(format!("thread node {} assembled twice", ids[idx]))
                })?;
                built[idx] = Some(ThreadNode { item, replies });
            } else {
                // duplicate ids would otherwise re-enter the same subtree
                if !visited.insert(ids[idx]) {
                    return Err(AppError::CycleDetected(ids[idx]));
                }
                stack.push((idx, true));
                stack.extend(kids(idx).iter().rev().map(|&child| (child, false)));
            }
        }
        if let Some(node) = built[root].take() {
            forest.push(node);
        }
    }

    Ok(forest)
}

/// Ids of `target` and every comment that transitively replies to it.
///
/// `target` is always part of the result, even when absent from `items`.
pub fn descendants_of<T: Threaded>(target: Uuid, items: &[T]) -> Result<HashSet<Uuid>> {
    let children = child_index(items);
    let mut collected = HashSet::from([target]);
    let mut worklist = vec![target];

    while let Some(parent) = worklist.pop() {
        for &idx in children.get(&Some(parent)).into_iter().flatten() {
            let child = items[idx].id();
            if !collected.insert(child) {
                return Err(AppError::CycleDetected(child));
            }
            worklist.push(child);
        }
    }

    Ok(collected)
}
