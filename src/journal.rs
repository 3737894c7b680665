//! Task journal: an ordered collection of tasks backed by one JSON file.
//!
//! A workspace holds two journals with the same shape: the live journal and the
//! archive. Both are loaded whole, mutated in memory and written back whole;
//! there is no incremental persistence and no locking, so the last `save` wins.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identity::{allocate_free_usage_id, now_timestamp, TaskId, NO_PARENT};
use crate::task::Task;

/// On-disk shape of a journal file.
#[derive(Debug, Default, Deserialize)]
struct JournalFile {
    #[serde(rename = "TaskList", default, deserialize_with = "null_as_empty")]
    task_list: Vec<Task>,
}

#[derive(Serialize)]
struct JournalFileRef<'a> {
    #[serde(rename = "TaskList")]
    task_list: &'a [Task],
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Task>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Task>>::deserialize(deserializer)?.unwrap_or_default())
}

/// In-memory task collection, iterated in insertion order and indexed by usage id.
#[derive(Debug, Clone)]
pub struct Journal {
    tasks: Vec<Task>,
    positions: HashMap<TaskId, usize>,
    path: PathBuf,
}

impl Journal {
    /// Empty journal that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Journal {
            tasks: Vec::new(),
            positions: HashMap::new(),
            path: path.into(),
        }
    }

    /// Build a journal from already-constructed tasks; fails on duplicate usage ids.
    pub fn from_tasks(path: impl Into<PathBuf>, tasks: Vec<Task>) -> Result<Self> {
        let mut journal = Journal::empty(path);
        for task in tasks {
            journal.add(task)?;
        }
        Ok(journal)
    }

    /// Load the journal stored at `path`. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let file: JournalFile = serde_json::from_str(&data)?;
        let journal = Journal::from_tasks(path, file.task_list)?;
        debug!(path = %path.display(), tasks = journal.len(), "loaded journal");
        Ok(journal)
    }

    /// Load the journal at `path`, or start an empty one if the file does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "journal file absent, starting empty");
            return Ok(Journal::empty(path));
        }
        Journal::load(path)
    }

    /// Write the whole collection back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        write_journal(&self.path, &self.tasks)
    }

    /// Write the whole collection to `path` and make it the new backing file.
    pub fn save_to(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        write_journal(&path, &self.tasks)?;
        self.path = path;
        Ok(())
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the backing file; note paths are relative to it.
    pub fn root_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn contains(&self, usage_id: TaskId) -> bool {
        self.positions.contains_key(&usage_id)
    }

    /// First usage id not taken in this journal.
    pub fn free_usage_id(&self) -> TaskId {
        allocate_free_usage_id(self.positions.keys().copied())
    }

    /// Create a new task stamped with the current time.
    pub fn create(&mut self, description: &str) -> &mut Task {
        self.create_at(description, now_timestamp())
    }

    /// Create a new task with an explicit creation timestamp.
    pub fn create_at(&mut self, description: &str, created_at: i64) -> &mut Task {
        let usage_id = self.free_usage_id();
        let task = Task::new(usage_id, description, created_at);
        let idx = self.push(task);
        &mut self.tasks[idx]
    }

    /// Insert an externally built task. Fails if its usage id is taken, or is
    /// the `NO_PARENT` sentinel.
    pub fn add(&mut self, task: Task) -> Result<()> {
        if task.usage_id == NO_PARENT {
            return Err(Error::InvalidArgument(format!(
                "the usage id {NO_PARENT} is reserved (task '{}')",
                task.description
            )));
        }
        if self.contains(task.usage_id) {
            return Err(Error::AlreadyExists(task.usage_id));
        }
        self.push(task);
        Ok(())
    }

    /// Remove a task and return it.
    ///
    /// Tasks that had it as parent become roots, so a later task recycling the
    /// same usage id never inherits them.
    pub fn delete(&mut self, usage_id: TaskId) -> Result<Task> {
        let idx = *self.positions.get(&usage_id).ok_or(Error::NotFound(usage_id))?;
        let task = self.tasks.remove(idx);
        self.positions.remove(&usage_id);
        for (pos, t) in self.tasks.iter().enumerate().skip(idx) {
            self.positions.insert(t.usage_id, pos);
        }
        for t in self.tasks.iter_mut() {
            if t.parent_id == usage_id {
                t.parent_id = NO_PARENT;
            }
        }
        Ok(task)
    }

    pub fn get(&self, usage_id: TaskId) -> Result<&Task> {
        self.positions
            .get(&usage_id)
            .map(|&idx| &self.tasks[idx])
            .ok_or(Error::NotFound(usage_id))
    }

    pub fn get_mut(&mut self, usage_id: TaskId) -> Result<&mut Task> {
        match self.positions.get(&usage_id) {
            Some(&idx) => Ok(&mut self.tasks[idx]),
            None => Err(Error::NotFound(usage_id)),
        }
    }

    /// Tasks matching `predicate`, in storage order.
    pub fn filter<F>(&self, predicate: F) -> Vec<&Task>
    where
        F: Fn(&Task) -> bool,
    {
        self.tasks.iter().filter(|t| predicate(t)).collect()
    }

    /// Mutable handles on the tasks matching `predicate`, in storage order.
    pub fn filter_mut<F>(&mut self, predicate: F) -> Vec<&mut Task>
    where
        F: Fn(&Task) -> bool,
    {
        self.tasks.iter_mut().filter(|t| predicate(t)).collect()
    }

    pub fn set_on_board(&mut self, usage_id: TaskId, on_board: bool) -> Result<()> {
        self.get_mut(usage_id)?.on_board = on_board;
        Ok(())
    }

    /// Make `parent` the parent of `child`; `NO_PARENT` detaches the child.
    ///
    /// Only the direct self-loop is refused here. Longer cycles are reported
    /// when the tree is walked.
    pub fn set_parent(&mut self, child: TaskId, parent: TaskId) -> Result<()> {
        if parent != NO_PARENT {
            if parent == child {
                return Err(Error::InvalidArgument(format!(
                    "a task can not be parent of itself (ID={child})"
                )));
            }
            self.get(parent)?;
        }
        self.get_mut(child)?.parent_id = parent;
        Ok(())
    }

    fn push(&mut self, task: Task) -> usize {
        let idx = self.tasks.len();
        self.positions.insert(task.usage_id, idx);
        self.tasks.push(task);
        idx
    }
}

/// Serialize `tasks` to `path` using a temp file and a rename.
fn write_journal(path: &Path, tasks: &[Task]) -> Result<()> {
    let data = serde_json::to_string_pretty(&JournalFileRef { task_list: tasks })?;
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), tasks = tasks.len(), "saved journal");
    Ok(())
}
