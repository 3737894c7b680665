//! Command implementations for the CLI interface.
//!
//! Every handler loads what it needs through the [`Session`], mutates it, saves
//! it and prints the result. Commands taking a list of ids process each id on
//! its own: a failing id is reported as a warning and the others still go
//! through.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::warn;

use crate::archive::{self, IntegrityIssue, TransferReport};
use crate::config::DEFAULT_CONTEXT;
use crate::error::{Error, Result};
use crate::fields::Status;
use crate::identity::{TaskId, NO_PARENT};
use crate::notes;
use crate::render::{self, RenderStyle};
use crate::session::Session;
use crate::task::Task;
use crate::tree;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Task description.
        #[arg(required = true)]
        text: Vec<String>,
        /// Usage id of the parent task.
        #[arg(long)]
        parent: Option<TaskId>,
    },

    /// List tasks (all of them by default).
    List {
        /// Only tasks on the board.
        #[arg(long)]
        board: bool,
        /// Render the parent/child tree.
        #[arg(long, conflicts_with_all = ["board", "status"])]
        tree: bool,
        /// Only tasks with this status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Write the plain listing to this file instead of printing it.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Change the status of tasks, or show their details.
    Status {
        /// Comma-separated ids to move to the next status.
        #[arg(long, value_delimiter = ',')]
        next: Vec<TaskId>,
        /// Comma-separated ids to move back to the previous status.
        #[arg(long, value_delimiter = ',')]
        prev: Vec<TaskId>,
        /// Comma-separated ids to describe.
        #[arg(long, value_delimiter = ',')]
        info: Vec<TaskId>,
    },

    /// Show the board, or put tasks on and off it.
    Board {
        /// Comma-separated ids to put on the board.
        #[arg(long, value_delimiter = ',')]
        add: Vec<TaskId>,
        /// Comma-separated ids to take off the board.
        #[arg(long, value_delimiter = ',')]
        remove: Vec<TaskId>,
        /// Take every task off the board.
        #[arg(long)]
        clear: bool,
    },

    /// Manage the note file of a task.
    Note {
        /// Create the note if needed and print its path.
        #[arg(long)]
        edit: Option<TaskId>,
        /// Print the note content.
        #[arg(long)]
        view: Option<TaskId>,
        /// Delete the note file.
        #[arg(long)]
        delete: Option<TaskId>,
        /// List the tasks that have a note.
        #[arg(long)]
        list: bool,
    },

    /// Attach tasks to a parent task (parent 0 detaches them).
    Child {
        /// Usage id of the parent.
        #[arg(long)]
        parent: TaskId,
        /// Comma-separated ids of the children.
        #[arg(long, required = true, value_delimiter = ',')]
        children: Vec<TaskId>,
    },

    /// Delete tasks for good, or move them to the archive.
    Delete {
        /// Move to the archive instead of deleting.
        #[arg(long)]
        archive: bool,
        /// Ids to delete (comma or space separated).
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<TaskId>,
    },

    /// Show the archive, or move tasks in and out of it.
    Archive {
        /// Comma-separated journal ids to archive.
        #[arg(long, value_delimiter = ',', conflicts_with = "restore")]
        add: Vec<TaskId>,
        /// Comma-separated archive ids to restore.
        #[arg(long, value_delimiter = ',')]
        restore: Vec<TaskId>,
    },

    /// Tree, board and notes in one document.
    Report {
        /// Write the plain report to this file instead of printing it.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Check journal and archive for identity problems.
    Check,

    /// Manage contexts (independent workspaces).
    Context {
        #[command(subcommand)]
        action: Option<ContextAction>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContextAction {
    /// List the contexts, active one marked (default).
    List,
    /// Create a context, or change its path, and make it active.
    New {
        name: String,
        /// Workspace directory, absolute or relative to the configuration root.
        #[arg(long)]
        path: Option<String>,
    },
    /// Make a context active.
    Select { name: String },
    /// Remove a context from the configuration. Its files stay on disk.
    Remove { name: String },
    /// Print configuration paths and parameters.
    Info,
}

/// Parse the configured default command line (e.g. `"board"` or `"list --tree"`).
pub fn default_command(line: &str) -> Result<Commands> {
    let argv = std::iter::once("todo").chain(line.split_whitespace());
    let cli = crate::cli::Cli::try_parse_from(argv)
        .map_err(|e| Error::InvalidArgument(format!("default command '{line}': {e}")))?;
    cli.command
        .ok_or_else(|| Error::InvalidArgument("the default command is empty".into()))
}

/// Dispatch one command.
pub fn run(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Add { text, parent } => cmd_add(session, text, parent),
        Commands::List { board, tree, status, file } => cmd_list(session, board, tree, status, file),
        Commands::Status { next, prev, info } => cmd_status(session, next, prev, info),
        Commands::Board { add, remove, clear } => cmd_board(session, add, remove, clear),
        Commands::Note { edit, view, delete, list } => cmd_note(session, edit, view, delete, list),
        Commands::Child { parent, children } => cmd_child(session, parent, children),
        Commands::Delete { archive, ids } => cmd_delete(session, archive, ids),
        Commands::Archive { add, restore } => cmd_archive(session, add, restore),
        Commands::Report { file } => cmd_report(session, file),
        Commands::Check => cmd_check(session),
        Commands::Context { action } => cmd_context(session, action.unwrap_or(ContextAction::List)),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Apply `op` to every id; failures are warned about and counted.
fn for_each_id<F>(ids: &[TaskId], mut op: F) -> usize
where
    F: FnMut(TaskId) -> Result<()>,
{
    let mut failed = 0;
    for &id in ids {
        if let Err(e) = op(id) {
            warn_skipped(id, &e);
            failed += 1;
        }
    }
    failed
}

fn warn_skipped(id: TaskId, err: &Error) {
    warn!(task = id, error = %err, "task skipped");
    eprintln!("WRN: task {id}: {err}");
}

fn batch_outcome(failed: usize, total: usize) -> Result<()> {
    if failed == 0 {
        Ok(())
    } else {
        Err(Error::PartialFailure { failed, total })
    }
}

fn warn_integrity(issues: &[IntegrityIssue]) {
    for issue in issues {
        warn!(%issue, "integrity issue");
        eprintln!("WRN: {issue}");
    }
}

/// Print `draw`'s output, or write its plain form under a dated header.
fn emit<F>(session: &Session, file: Option<PathBuf>, draw: F) -> Result<()>
where
    F: Fn(&RenderStyle) -> Result<String>,
{
    match file {
        None => print!("{}", draw(&session.style)?),
        Some(path) => {
            let style = RenderStyle::plain().with_indicators(session.style.indicators.clone());
            let body = draw(&style)?;
            fs::write(&path, format!("{}{}", render::file_header(Local::now()), body))?;
            println!("Written to {}", path.display());
        }
    }
    Ok(())
}

/// Add a new task to the journal.
pub fn cmd_add(session: &Session, text: Vec<String>, parent: Option<TaskId>) -> Result<()> {
    let description = text.join(" ");
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::InvalidArgument("a task needs a description".into()));
    }
    let mut journal = session.open_journal()?;
    if let Some(pid) = parent.filter(|&p| p != NO_PARENT) {
        journal.get(pid)?;
    }
    let id = journal.create(description).usage_id;
    if let Some(pid) = parent {
        journal.set_parent(id, pid)?;
    }
    journal.save()?;
    println!("{}", render::task_line(journal.get(id)?, &session.style));
    Ok(())
}

/// List tasks with optional filters, or as a tree.
pub fn cmd_list(
    session: &Session,
    board: bool,
    tree: bool,
    status: Option<Status>,
    file: Option<PathBuf>,
) -> Result<()> {
    let journal = session.open_journal()?;
    emit(session, file, |style| {
        if tree {
            return render::tree(&journal, style);
        }
        let tasks = journal.filter(|t| (!board || t.on_board) && status.map_or(true, |s| t.status == s));
        Ok(render::listing(&tasks, style))
    })
}

/// Advance, retreat or describe tasks.
pub fn cmd_status(session: &Session, next: Vec<TaskId>, prev: Vec<TaskId>, info: Vec<TaskId>) -> Result<()> {
    let chosen = [&next, &prev, &info].iter().filter(|ids| !ids.is_empty()).count();
    if chosen != 1 {
        return Err(Error::InvalidArgument(
            "choose exactly one of --next, --prev or --info".into(),
        ));
    }
    let mut journal = session.open_journal()?;

    if !info.is_empty() {
        let mut blocks = Vec::new();
        let failed = for_each_id(&info, |id| {
            blocks.push(render::task_info(&journal, id)?);
            Ok(())
        });
        if !blocks.is_empty() {
            println!("\n{}\n", blocks.join("\n\n"));
        }
        return batch_outcome(failed, info.len());
    }

    let (ids, forward) = if next.is_empty() { (prev, false) } else { (next, true) };
    let mut changed = Vec::new();
    let failed = for_each_id(&ids, |id| {
        let task = journal.get_mut(id)?;
        if forward {
            task.status.advance()?;
        } else {
            task.status.retreat()?;
        }
        changed.push(id);
        Ok(())
    });
    if !changed.is_empty() {
        journal.save()?;
        changed.dedup();
        let tasks: Vec<&Task> = changed.iter().filter_map(|&id| journal.get(id).ok()).collect();
        print!("{}", render::listing(&tasks, &session.style));
    }
    batch_outcome(failed, ids.len())
}

/// Edit the board and print it.
pub fn cmd_board(session: &Session, add: Vec<TaskId>, remove: Vec<TaskId>, clear: bool) -> Result<()> {
    let mut journal = session.open_journal()?;
    let mut failed = for_each_id(&add, |id| {
        journal.set_on_board(id, true)?;
        println!("Task of index {id} has been added on board");
        Ok(())
    });
    failed += for_each_id(&remove, |id| {
        journal.set_on_board(id, false)?;
        println!("Task of index {id} has been removed from board");
        Ok(())
    });
    if clear {
        for task in journal.filter_mut(|t| t.on_board) {
            task.on_board = false;
        }
        println!("The board has been cleared");
    }
    let total = add.len() + remove.len();
    if clear || failed < total {
        journal.save()?;
    }
    print!("{}", render::listing(&journal.filter(|t| t.on_board), &session.style));
    batch_outcome(failed, total)
}

/// Create, view, delete or list note files.
pub fn cmd_note(
    session: &Session,
    edit: Option<TaskId>,
    view: Option<TaskId>,
    delete: Option<TaskId>,
    list: bool,
) -> Result<()> {
    let mut journal = session.open_journal()?;
    match (edit, view, delete, list) {
        (Some(id), None, None, false) => {
            let path = notes::ensure_note(&mut journal, id)?;
            journal.save()?;
            println!("The note of the task {id} can be edited in file: {}", path.display());
        }
        (None, Some(id), None, false) => println!("{}", notes::read_note(&journal, id)?),
        (None, None, Some(id), false) => {
            notes::delete_note(&mut journal, id)?;
            journal.save()?;
            println!("The note of the task {id} has been deleted");
        }
        (None, None, None, true) => {
            print!("{}", render::listing(&journal.filter(|t| t.has_note()), &session.style));
        }
        _ => {
            return Err(Error::InvalidArgument(
                "choose exactly one of --edit, --view, --delete or --list".into(),
            ))
        }
    }
    Ok(())
}

/// Attach `children` to `parent` and print the resulting tree.
pub fn cmd_child(session: &Session, parent: TaskId, children: Vec<TaskId>) -> Result<()> {
    let mut journal = session.open_journal()?;
    if parent != NO_PARENT {
        journal.get(parent)?;
    }
    let failed = for_each_id(&children, |id| {
        if parent != NO_PARENT && tree::ancestors(journal.tasks(), parent).contains(&id) {
            return Err(Error::InvalidArgument(format!(
                "the task {id} is an ancestor of the task {parent}"
            )));
        }
        journal.set_parent(id, parent)
    });
    if failed < children.len() {
        journal.save()?;
        print!("{}", render::tree(&journal, &session.style)?);
    }
    batch_outcome(failed, children.len())
}

/// Delete tasks permanently (with their notes) or archive them.
pub fn cmd_delete(session: &Session, archive: bool, ids: Vec<TaskId>) -> Result<()> {
    if archive {
        return archive_tasks(session, &ids);
    }
    let mut journal = session.open_journal()?;
    let failed = for_each_id(&ids, |id| {
        notes::purge_task(&mut journal, id)?;
        println!("Task {id} has been deleted");
        Ok(())
    });
    if failed < ids.len() {
        journal.save()?;
    }
    batch_outcome(failed, ids.len())
}

/// List the archive, or transfer tasks in or out of it.
pub fn cmd_archive(session: &Session, add: Vec<TaskId>, restore: Vec<TaskId>) -> Result<()> {
    if !add.is_empty() {
        return archive_tasks(session, &add);
    }
    if !restore.is_empty() {
        return restore_tasks(session, &restore);
    }
    let (_, archive, issues) = session.open_both()?;
    warn_integrity(&issues);
    let tasks: Vec<&Task> = archive.iter().collect();
    print!("{}", render::listing(&tasks, &session.style));
    Ok(())
}

fn archive_tasks(session: &Session, ids: &[TaskId]) -> Result<()> {
    let (mut journal, mut archive, issues) = session.open_both()?;
    warn_integrity(&issues);
    let report = archive::archive_batch(&mut journal, &mut archive, ids);
    if !report.moved.is_empty() {
        archive::persist_transfer(&journal, &archive)?;
    }
    for (from, to) in &report.moved {
        println!("Task {from} moved to the archive with a new usage index: {to}");
    }
    transfer_outcome(&report, ids.len())
}

fn restore_tasks(session: &Session, ids: &[TaskId]) -> Result<()> {
    let (mut journal, mut archive, issues) = session.open_both()?;
    warn_integrity(&issues);
    let report = archive::restore_batch(&mut archive, &mut journal, ids);
    if !report.moved.is_empty() {
        archive::persist_transfer(&archive, &journal)?;
    }
    for (from, to) in &report.moved {
        println!("Task {from} restored from archive with a new usage index: {to}");
    }
    transfer_outcome(&report, ids.len())
}

fn transfer_outcome(report: &TransferReport, total: usize) -> Result<()> {
    for (id, err) in &report.failed {
        eprintln!("WRN: task {id}: {err}");
    }
    batch_outcome(report.failed.len(), total)
}

/// Print or write the full report.
pub fn cmd_report(session: &Session, file: Option<PathBuf>) -> Result<()> {
    let journal = session.open_journal()?;
    emit(session, file, |style| render::report(&journal, style))
}

/// Print every identity or hierarchy problem found in the workspace.
pub fn cmd_check(session: &Session) -> Result<()> {
    let (journal, archive, issues) = session.open_both()?;
    let mut problems: Vec<String> = issues.iter().map(ToString::to_string).collect();
    if let Err(e) = tree::walk(journal.tasks()) {
        problems.push(format!("journal: {e}"));
    }
    if problems.is_empty() {
        println!(
            "No integrity issue found ({} tasks in the journal, {} in the archive)",
            journal.len(),
            archive.len()
        );
    } else {
        for p in &problems {
            println!("- {p}");
        }
        return Err(Error::Inconsistent(problems.len()));
    }
    Ok(())
}

/// Handle context management commands.
pub fn cmd_context(session: &mut Session, action: ContextAction) -> Result<()> {
    match action {
        ContextAction::List => {}
        ContextAction::New { name, path } => {
            let path = path.unwrap_or_else(|| {
                println!("No path given for the context, defaulting to {name}");
                name.clone()
            });
            if session.config.upsert_context(&name, &path)? {
                println!("Creating the context {name} with path {path}");
            } else {
                println!("Updating the context {name} with path {path}");
            }
            session.save_config()?;
        }
        ContextAction::Select { name } => {
            session.config.select(&name)?;
            session.save_config()?;
        }
        ContextAction::Remove { name } => {
            let was_active = session.config.context_name == name;
            let removed = session.config.remove_context(&name)?;
            session.save_config()?;
            println!("The context {name} has been removed from the configuration");
            println!("The workspace still exists in folder: {}", removed.dir(session.home()).display());
            if was_active {
                println!("The active context is reset to {DEFAULT_CONTEXT}");
            }
        }
        ContextAction::Info => {
            print!("{}", context_info(session)?);
            return Ok(());
        }
    }
    print!(
        "{}",
        render::contexts(&session.config.contexts, &session.config.context_name, &session.style)
    );
    Ok(())
}

fn context_info(session: &Session) -> Result<String> {
    let context = session.context()?;
    let home = session.home();
    let mut out = String::from("\n");
    out.push_str("Configuration files:\n--------------------\n\n");
    out.push_str(&format!(" Configuration root directory: {}\n", home.display()));
    out.push_str(&format!(" Configuration file path     : {}\n\n", session.config_path().display()));
    out.push_str("Active context:\n---------------\n\n");
    out.push_str(&format!(" Name         : {}\n", context.name));
    out.push_str(&format!(" Workspace    : {}\n", context.dir(home).display()));
    out.push_str(&format!(" Journal file : {}\n", context.journal_path(home).display()));
    out.push_str(&format!(" Archive file : {}\n\n", context.archive_path(home).display()));
    out.push_str("Parameters:\n-----------\n\n");
    out.push_str(&serde_json::to_string_pretty(&session.config.parameters)?);
    out.push('\n');
    Ok(out)
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path(), true, true).unwrap();
        (dir, session)
    }

    #[test]
    fn default_command_parses_configured_line() {
        assert!(matches!(default_command("board").unwrap(), Commands::Board { clear: false, .. }));
        assert!(matches!(default_command("list --tree").unwrap(), Commands::List { tree: true, .. }));
        assert!(matches!(default_command(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(default_command("dance"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn batch_status_change_keeps_going_after_a_bad_id() {
        let (_dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        journal.create("a");
        journal.create("b");
        journal.save().unwrap();

        let err = cmd_status(&session, vec![1, 9, 2], vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::PartialFailure { failed: 1, total: 3 }));
        let journal = session.open_journal().unwrap();
        assert_eq!(journal.get(1).unwrap().status, Status::Doing);
        assert_eq!(journal.get(2).unwrap().status, Status::Doing);
    }

    #[test]
    fn status_needs_exactly_one_operation() {
        let (_dir, session) = session();
        assert!(matches!(
            cmd_status(&session, vec![], vec![], vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            cmd_status(&session, vec![1], vec![1], vec![]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn child_refuses_to_close_a_loop() {
        let (_dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        journal.create("a");
        journal.create("b");
        journal.set_parent(2, 1).unwrap();
        journal.save().unwrap();

        let err = cmd_child(&session, 2, vec![1]).unwrap_err();
        assert!(matches!(err, Error::PartialFailure { failed: 1, total: 1 }));
        assert_eq!(session.open_journal().unwrap().get(1).unwrap().parent_id, NO_PARENT);

        cmd_child(&session, NO_PARENT, vec![2]).unwrap();
        assert_eq!(session.open_journal().unwrap().get(2).unwrap().parent_id, NO_PARENT);
    }

    #[test]
    fn archive_then_restore_through_commands() {
        let (_dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        let gid = journal.create("keep me").global_id;
        journal.create("other");
        journal.save().unwrap();

        cmd_archive(&session, vec![1], vec![]).unwrap();
        let archive = session.open_archive().unwrap();
        assert!(archive.contains(gid));
        assert!(!session.open_journal().unwrap().contains(1));

        cmd_archive(&session, vec![], vec![gid]).unwrap();
        let journal = session.open_journal().unwrap();
        assert_eq!(journal.get(1).unwrap().global_id, gid);
        assert!(session.open_archive().unwrap().is_empty());
    }

    #[test]
    fn check_fails_on_a_looping_journal() {
        let (_dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        journal.create("a");
        journal.create("b");
        journal.save().unwrap();
        cmd_check(&session).unwrap();

        journal.set_parent(1, 2).unwrap();
        journal.set_parent(2, 1).unwrap();
        journal.save().unwrap();
        assert!(matches!(cmd_check(&session), Err(Error::Inconsistent(1))));
    }

    #[test]
    fn permanent_delete_removes_the_note() {
        let (_dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        journal.create("with a note");
        let path = notes::ensure_note(&mut journal, 1).unwrap();
        journal.save().unwrap();

        cmd_delete(&session, false, vec![1]).unwrap();
        assert!(!path.exists());
        assert!(session.open_journal().unwrap().is_empty());
    }

    #[test]
    fn list_to_file_writes_plain_text() {
        let (dir, session) = session();
        let mut journal = session.open_journal().unwrap();
        journal.create("printable");
        journal.save().unwrap();

        let out = dir.path().join("list.txt");
        cmd_list(&session, false, false, None, Some(out.clone())).unwrap();
        let text = fs::read_to_string(out).unwrap();
        assert!(text.starts_with("TODO list at "));
        assert!(text.contains("o : printable"));
        assert!(!text.contains('\u{1b}'));
    }
}
