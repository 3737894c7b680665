//! Note files attached to tasks.
//!
//! A note is a free-text file whose content is opaque to the journal. The
//! journal only decides where the file lives and records that path on the
//! task. Default notes are named after the task's global id so the name stays
//! valid after the task moves between journal and archive.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::identity::TaskId;
use crate::journal::Journal;
use crate::task::Task;

/// Directory (relative to the journal directory) holding default note files.
pub const NOTEBOOK_DIRNAME: &str = "notes";

/// Default relative note path for a task: `notes/<global id>.rst`.
pub fn default_note_path(task: &Task) -> PathBuf {
    Path::new(NOTEBOOK_DIRNAME).join(format!("{}.rst", task.global_id))
}

/// Resolve a stored note path against the journal directory.
pub fn resolve(journal: &Journal, note_path: &str) -> PathBuf {
    let p = Path::new(note_path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        journal.root_dir().join(p)
    }
}

/// Absolute path of the note of `usage_id`, or `None` if it has none.
pub fn note_path(journal: &Journal, usage_id: TaskId) -> Result<Option<PathBuf>> {
    let task = journal.get(usage_id)?;
    if !task.has_note() {
        return Ok(None);
    }
    Ok(Some(resolve(journal, &task.note_path)))
}

/// Absolute path of the note of `usage_id`, creating the file if needed.
///
/// A new note starts with the task title underlined by `=`.
pub fn ensure_note(journal: &mut Journal, usage_id: TaskId) -> Result<PathBuf> {
    let task = journal.get(usage_id)?;
    let relative = if task.has_note() {
        task.note_path.clone()
    } else {
        default_note_path(task).to_string_lossy().into_owned()
    };
    let title = format!("{:02} - {}", task.usage_id, task.description);
    let path = resolve(journal, &relative);

    if !path.exists() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let underline = "=".repeat(title.chars().count());
        fs::write(&path, format!("{title}\n{underline}\n"))?;
        debug!(task = usage_id, path = %path.display(), "created note file");
    }
    journal.get_mut(usage_id)?.note_path = relative;
    Ok(path)
}

/// Remove the note file of `usage_id` and forget its path.
pub fn delete_note(journal: &mut Journal, usage_id: TaskId) -> Result<()> {
    let path = note_path(journal, usage_id)?.ok_or(Error::NoNote(usage_id))?;
    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    journal.get_mut(usage_id)?.note_path.clear();
    debug!(task = usage_id, path = %path.display(), "deleted note file");
    Ok(())
}

/// Delete `usage_id` from the journal for good, along with its note file.
pub fn purge_task(journal: &mut Journal, usage_id: TaskId) -> Result<Task> {
    if journal.get(usage_id)?.has_note() {
        delete_note(journal, usage_id)?;
    }
    journal.delete(usage_id)
}

/// Content of the note of `usage_id`.
pub fn read_note(journal: &Journal, usage_id: TaskId) -> Result<String> {
    let path = note_path(journal, usage_id)?.ok_or(Error::NoNote(usage_id))?;
    Ok(fs::read_to_string(path)?)
}

/// All note contents concatenated; unreadable notes contribute their error text.
pub fn notes_digest(journal: &Journal) -> String {
    let mut out = String::new();
    for task in journal.iter().filter(|t| t.has_note()) {
        let path = resolve(journal, &task.note_path);
        match fs::read_to_string(&path) {
            Ok(content) => out.push_str(&content),
            Err(e) => out.push_str(&format!("{}: {e}", path.display())),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_in(dir: &Path) -> Journal {
        let mut journal = Journal::empty(dir.join("journal.json"));
        journal.create_at("Write the café menu", 1_700_000_000);
        journal.create_at("Buy bread", 1_700_000_100);
        journal
    }

    #[test]
    fn task_without_note_has_no_path() {
        let dir = tempfile::tempdir().unwrap();
        let journal = journal_in(dir.path());
        assert_eq!(note_path(&journal, 1).unwrap(), None);
        assert!(matches!(note_path(&journal, 8), Err(Error::NotFound(8))));
    }

    #[test]
    fn ensure_note_creates_a_titled_file_named_after_the_global_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = journal_in(dir.path());
        let gid = journal.get(1).unwrap().global_id;

        let path = ensure_note(&mut journal, 1).unwrap();
        assert_eq!(path, dir.path().join("notes").join(format!("{gid}.rst")));
        let content = fs::read_to_string(&path).unwrap();
        let title = "01 - Write the café menu";
        assert_eq!(content, format!("{title}\n{}\n", "=".repeat(title.chars().count())));
        assert_eq!(journal.get(1).unwrap().note_path, format!("notes/{gid}.rst"));

        // A second call keeps the existing content.
        fs::write(&path, "edited").unwrap();
        assert_eq!(ensure_note(&mut journal, 1).unwrap(), path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "edited");
    }

    #[test]
    fn delete_note_removes_file_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = journal_in(dir.path());
        let path = ensure_note(&mut journal, 2).unwrap();
        delete_note(&mut journal, 2).unwrap();
        assert!(!path.exists());
        assert!(!journal.get(2).unwrap().has_note());
        assert!(matches!(delete_note(&mut journal, 2), Err(Error::NoNote(2))));
    }

    #[test]
    fn purge_removes_task_and_note() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = journal_in(dir.path());
        let path = ensure_note(&mut journal, 1).unwrap();
        let removed = purge_task(&mut journal, 1).unwrap();
        assert_eq!(removed.description, "Write the café menu");
        assert!(!path.exists());
        assert!(!journal.contains(1));
        purge_task(&mut journal, 2).unwrap();
        assert!(journal.is_empty());
    }

    #[test]
    fn digest_concatenates_notes() {
        let dir = tempfile::tempdir().unwrap();
        let mut journal = journal_in(dir.path());
        ensure_note(&mut journal, 1).unwrap();
        ensure_note(&mut journal, 2).unwrap();
        let digest = notes_digest(&journal);
        assert!(digest.contains("01 - Write the café menu"));
        assert!(digest.contains("02 - Buy bread"));
        assert_eq!(read_note(&journal, 2).unwrap(), "02 - Buy bread\n==============\n");
    }
}
