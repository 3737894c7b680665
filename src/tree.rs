//! Parent/child hierarchy of a task collection.
//!
//! The hierarchy is read from user-editable data and nothing guarantees it is
//! acyclic, so the walk is iterative and every task owns one visited slot. A
//! task reachable twice, or never reachable from a root, is reported as part of
//! a cycle instead of being rendered.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::identity::{TaskId, NO_PARENT};
use crate::task::Task;

/// One rendered row of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub usage_id: TaskId,
    pub depth: usize,
}

/// Map each parent id to its children in collection order.
///
/// Roots are stored under `NO_PARENT`. A task whose parent is not in the
/// collection is a root too.
pub fn build_children_map(tasks: &[Task]) -> HashMap<TaskId, Vec<TaskId>> {
    let present: HashSet<TaskId> = tasks.iter().map(|t| t.usage_id).collect();
    let mut map: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for t in tasks {
        let key = if t.has_parent() && present.contains(&t.parent_id) {
            t.parent_id
        } else {
            NO_PARENT
        };
        map.entry(key).or_default().push(t.usage_id);
    }
    map
}

/// Depth-first order of the whole collection, roots in collection order.
pub fn walk(tasks: &[Task]) -> Result<Vec<TreeEntry>> {
    let children = build_children_map(tasks);
    let slots: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(slot, t)| (t.usage_id, slot))
        .collect();
    let mut visited = vec![false; tasks.len()];
    let mut entries = Vec::with_capacity(tasks.len());

    let mut stack: Vec<TreeEntry> = children
        .get(&NO_PARENT)
        .map(|roots| {
            roots
                .iter()
                .rev()
                .map(|&usage_id| TreeEntry { usage_id, depth: 0 })
                .collect()
        })
        .unwrap_or_default();

    while let Some(entry) = stack.pop() {
        let Some(&slot) = slots.get(&entry.usage_id) else {
            continue;
        };
        if visited[slot] {
            return Err(Error::CycleDetected(vec![entry.usage_id]));
        }
        visited[slot] = true;
        entries.push(entry);
        if let Some(kids) = children.get(&entry.usage_id) {
            for &kid in kids.iter().rev() {
                stack.push(TreeEntry {
                    usage_id: kid,
                    depth: entry.depth + 1,
                });
            }
        }
    }

    let stranded: Vec<TaskId> = tasks
        .iter()
        .enumerate()
        .filter(|(slot, _)| !visited[*slot])
        .map(|(_, t)| t.usage_id)
        .collect();
    if !stranded.is_empty() {
        return Err(Error::CycleDetected(stranded));
    }
    Ok(entries)
}

/// Ancestors of `usage_id`, closest first. Stops at a missing parent or a repeat.
pub fn ancestors(tasks: &[Task], usage_id: TaskId) -> Vec<TaskId> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.usage_id, t)).collect();
    let mut chain = Vec::new();
    let mut seen = HashSet::from([usage_id]);
    let mut cur = by_id.get(&usage_id).map(|t| t.parent_id);
    while let Some(pid) = cur {
        if pid == NO_PARENT || !seen.insert(pid) {
            break;
        }
        let Some(parent) = by_id.get(&pid) else {
            break;
        };
        chain.push(pid);
        cur = Some(parent.parent_id);
    }
    chain
}
