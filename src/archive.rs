//! Moving tasks between the live journal and the archive.
//!
//! Journal and archive have independent usage-id namespaces. A task entering
//! the archive takes its own global id as usage id; a task coming back gets
//! the lowest free usage id of the journal. The global id itself is never
//! touched, so it is what ties both sides together.
//!
//! The two collections live in two files with no shared transaction. Callers
//! persist with [`persist_transfer`], which always writes the destination
//! before the source: a crash in between leaves the task in both files (which
//! [`reconcile`] reports) rather than in neither.

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::identity::{TaskId, NO_PARENT};
use crate::journal::Journal;
use crate::task::Task;

/// Outcome of a batch transfer: each id either moved or failed on its own.
#[derive(Debug, Default)]
pub struct TransferReport {
    /// `(old usage id, new usage id)` pairs, in request order.
    pub moved: Vec<(TaskId, TaskId)>,
    pub failed: Vec<(TaskId, Error)>,
}

impl TransferReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Move `usage_id` from `journal` to `archive`; returns its archive usage id.
pub fn move_to_archive(journal: &mut Journal, archive: &mut Journal, usage_id: TaskId) -> Result<TaskId> {
    let new_id = transfer(journal, archive, usage_id, |task, _| task.global_id)?;
    info!(from = usage_id, to = new_id, "task moved to the archive");
    Ok(new_id)
}

/// Move `usage_id` from `archive` back to `journal`; returns its new journal usage id.
pub fn restore_from_archive(archive: &mut Journal, journal: &mut Journal, usage_id: TaskId) -> Result<TaskId> {
    let new_id = transfer(archive, journal, usage_id, |_, destination| destination.free_usage_id())?;
    info!(from = usage_id, to = new_id, "task restored from the archive");
    Ok(new_id)
}

/// Archive every id of `ids`, continuing past failures.
pub fn archive_batch(journal: &mut Journal, archive: &mut Journal, ids: &[TaskId]) -> TransferReport {
    batch(ids, |id| move_to_archive(journal, archive, id))
}

/// Restore every id of `ids`, continuing past failures.
pub fn restore_batch(archive: &mut Journal, journal: &mut Journal, ids: &[TaskId]) -> TransferReport {
    batch(ids, |id| restore_from_archive(archive, journal, id))
}

/// Save both sides of a transfer, destination first.
pub fn persist_transfer(source: &Journal, destination: &Journal) -> Result<()> {
    destination.save()?;
    source.save()
}

fn batch<F>(ids: &[TaskId], mut op: F) -> TransferReport
where
    F: FnMut(TaskId) -> Result<TaskId>,
{
    let mut report = TransferReport::default();
    for &id in ids {
        match op(id) {
            Ok(new_id) => report.moved.push((id, new_id)),
            Err(e) => {
                warn!(task = id, error = %e, "transfer failed");
                report.failed.push((id, e));
            }
        }
    }
    report
}

/// Delete from `source`, renumber, add to `destination`.
///
/// The destination slot is checked before the source is touched, so a failed
/// transfer leaves both collections unchanged. Parent links never cross
/// namespaces: the moved task arrives as a root.
fn transfer<F>(source: &mut Journal, destination: &mut Journal, usage_id: TaskId, new_id_for: F) -> Result<TaskId>
where
    F: FnOnce(&Task, &Journal) -> TaskId,
{
    let new_id = new_id_for(source.get(usage_id)?, destination);
    if destination.contains(new_id) {
        return Err(Error::AlreadyExists(new_id));
    }
    let mut task = source.delete(usage_id)?;
    task.usage_id = new_id;
    task.parent_id = NO_PARENT;
    destination.add(task)?;
    Ok(new_id)
}

/// Which collection an integrity issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Journal,
    Archive,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Journal => f.write_str("journal"),
            Collection::Archive => f.write_str("archive"),
        }
    }
}

/// Identity inconsistency between or within the two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// The same task is live and archived at once (interrupted transfer).
    InBothCollections {
        global_id: TaskId,
        journal_id: TaskId,
        archive_id: TaskId,
    },
    /// Two tasks of one collection share a global id.
    RepeatedGlobalId {
        collection: Collection,
        global_id: TaskId,
        usage_ids: Vec<TaskId>,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::InBothCollections {
                global_id,
                journal_id,
                archive_id,
            } => write!(
                f,
                "task {global_id} is both in the journal (as {journal_id}) and in the archive (as {archive_id})"
            ),
            IntegrityIssue::RepeatedGlobalId {
                collection,
                global_id,
                usage_ids,
            } => write!(
                f,
                "global id {global_id} is shared by tasks {usage_ids:?} of the {collection}"
            ),
        }
    }
}

/// Scan both collections for global ids that appear twice.
pub fn reconcile(journal: &Journal, archive: &Journal) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let live = group_by_global_id(journal);
    let archived = group_by_global_id(archive);

    for (collection, groups) in [(Collection::Journal, &live), (Collection::Archive, &archived)] {
        for (&global_id, usage_ids) in groups {
            if usage_ids.len() > 1 {
                issues.push(IntegrityIssue::RepeatedGlobalId {
                    collection,
                    global_id,
                    usage_ids: usage_ids.clone(),
                });
            }
        }
    }
    for task in journal.iter() {
        if let Some(archive_ids) = archived.get(&task.global_id) {
            issues.push(IntegrityIssue::InBothCollections {
                global_id: task.global_id,
                journal_id: task.usage_id,
                archive_id: archive_ids[0],
            });
        }
    }
    issues.sort_by_key(|issue| match issue {
        IntegrityIssue::InBothCollections { global_id, .. } => (0, *global_id),
        IntegrityIssue::RepeatedGlobalId { global_id, .. } => (1, *global_id),
    });
    issues.dedup();
    issues
}

fn group_by_global_id(journal: &Journal) -> HashMap<TaskId, Vec<TaskId>> {
    let mut groups: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for task in journal.iter() {
        groups.entry(task.global_id).or_default().push(task.usage_id);
    }
    groups
}
