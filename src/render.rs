//! Text rendering of tasks, listings, trees and reports.
//!
//! Presentation is decided once per invocation into a [`RenderStyle`] and
//! handed to every formatter; nothing here reads configuration on its own.

use chrono::{DateTime, Local, TimeZone};
use crossterm::style::{Color, Stylize};

use crate::config::Context;
use crate::error::Result;
use crate::fields::Status;
use crate::identity::{local_date, TaskId};
use crate::journal::Journal;
use crate::notes;
use crate::task::Task;
use crate::tree;

/// Default indicators template.
pub const DEFAULT_INDICATORS: &str = "[{date}:{note}{board}]";

const NO_TASKS: &str = "No tasks. Go have a drink";
const TREE_INDENT: &str = "   ";

/// Symbol set used for status markers and tree connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyphs {
    Plain,
    Pretty,
}

/// Whether output carries ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Mono,
    Color,
}

/// Rendering capability resolved from configuration and command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub glyphs: Glyphs,
    pub palette: Palette,
    /// Template with `{date}`, `{note}` and `{board}` placeholders.
    pub indicators: String,
}

impl RenderStyle {
    pub fn new(glyphs: Glyphs, palette: Palette) -> Self {
        RenderStyle {
            glyphs,
            palette,
            indicators: DEFAULT_INDICATORS.to_string(),
        }
    }

    /// Plain symbols, no color. Used for file output.
    pub fn plain() -> Self {
        RenderStyle::new(Glyphs::Plain, Palette::Mono)
    }

    pub fn with_indicators(mut self, template: impl Into<String>) -> Self {
        self.indicators = template.into();
        self
    }

    pub fn symbol(&self, status: Status) -> &'static str {
        match (self.glyphs, status) {
            (Glyphs::Plain, Status::Todo) => "o",
            (Glyphs::Plain, Status::Doing) => ">",
            (Glyphs::Plain, Status::Done) => "x",
            (Glyphs::Pretty, Status::Todo) => "\u{25cb}",
            (Glyphs::Pretty, Status::Doing) => "\u{25b6}",
            (Glyphs::Pretty, Status::Done) => "\u{25cf}",
        }
    }

    /// Paint `text` in the color of `status` (no-op in `Mono`).
    pub fn paint(&self, text: &str, status: Status) -> String {
        match self.palette {
            Palette::Mono => text.to_string(),
            Palette::Color => text.with(status_color(status)).bold().to_string(),
        }
    }

    pub fn marker(&self, status: Status) -> String {
        self.paint(self.symbol(status), status)
    }

    /// `Legend: o todo  > doing  x done`
    pub fn legend(&self) -> String {
        let items: Vec<String> = Status::ALL
            .iter()
            .map(|&s| self.paint(&format!("{} {}", self.symbol(s), s.label()), s))
            .collect();
        format!("Legend: {}", items.join("  "))
    }

    fn connector(&self) -> &'static str {
        match self.glyphs {
            Glyphs::Plain => " \\_",
            Glyphs::Pretty => " \u{2514}\u{2500}",
        }
    }

    /// Prefix of a tree row at `depth`.
    pub fn tree_prefix(&self, depth: usize) -> String {
        if depth == 0 {
            return String::new();
        }
        format!("{}{} ", TREE_INDENT.repeat(depth - 1), self.connector())
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Todo => Color::Green,
        Status::Doing => Color::Rgb { r: 255, g: 165, b: 0 },
        Status::Done => Color::Blue,
    }
}

/// `YYYY-MM-DD` of a unix timestamp in local time.
pub fn date_label(timestamp: i64) -> String {
    local_date(timestamp)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".into())
}

/// Expand the indicators template for `task`.
pub fn indicators(task: &Task, style: &RenderStyle) -> String {
    style
        .indicators
        .replace("{date}", &date_label(task.created_at))
        .replace("{note}", if task.has_note() { "n" } else { "-" })
        .replace("{board}", if task.on_board { "b" } else { "-" })
}

/// One-line form: usage id, indicators, status marker, description.
pub fn task_line(task: &Task, style: &RenderStyle) -> String {
    format!(
        "{:>2} {} {} : {}",
        task.usage_id,
        indicators(task, style),
        style.marker(task.status),
        task.description
    )
}

/// Listing of `tasks` followed by the legend.
pub fn listing(tasks: &[&Task], style: &RenderStyle) -> String {
    let mut out = String::from("\n");
    if tasks.is_empty() {
        out.push_str(NO_TASKS);
        out.push_str("\n\n");
        return out;
    }
    for t in tasks {
        out.push_str(&task_line(t, style));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&style.legend());
    out.push('\n');
    out
}

/// Indented tree of the whole journal followed by the legend.
pub fn tree(journal: &Journal, style: &RenderStyle) -> Result<String> {
    if journal.is_empty() {
        return Ok(format!("\n{NO_TASKS}\n\n"));
    }
    let mut out = String::from("\n");
    for entry in tree::walk(journal.tasks())? {
        let task = journal.get(entry.usage_id)?;
        out.push_str(&style.tree_prefix(entry.depth));
        out.push_str(&task_line(task, style));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&style.legend());
    out.push('\n');
    Ok(out)
}

/// Multi-line description of one task, with its resolved note path.
pub fn task_info(journal: &Journal, usage_id: TaskId) -> Result<String> {
    let task = journal.get(usage_id)?;
    let note = notes::note_path(journal, usage_id)?
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let created = Local
        .timestamp_opt(task.created_at, 0)
        .single()
        .map(|dt| dt.format("%A %Y-%B-%d at %H:%M:%S").to_string())
        .unwrap_or_else(|| task.created_at.to_string());

    let mut out = String::new();
    out.push_str(&format!("Task               : {}\n", task.description));
    out.push_str(&format!("Usage Index  (UID) : {}\n", task.usage_id));
    out.push_str(&format!("Global Index (GID) : {}\n", task.global_id));
    out.push_str(&format!("Creation Date      : {created}\n"));
    out.push_str(&format!("Status             : {}\n", task.status.label()));
    out.push_str(&format!("Is on board        : {}\n", task.on_board));
    out.push_str(&format!("Note filepath      : {note}\n"));
    out.push_str(&format!("Parent UID         : {}", task.parent_id));
    Ok(out)
}

/// Tree, board and notes in one document.
pub fn report(journal: &Journal, style: &RenderStyle) -> Result<String> {
    let rule = "\n------------------------------------------------------\n";
    let mut out = tree(journal, style)?;
    out.push_str(rule);
    out.push_str("Board:\n");
    out.push_str(&listing(&journal.filter(|t| t.on_board), style));
    out.push_str(rule);
    out.push_str("Notes:\n\n");
    out.push_str(&notes::notes_digest(journal));
    Ok(out)
}

/// Context list with the active one highlighted.
pub fn contexts(contexts: &[Context], active: &str, style: &RenderStyle) -> String {
    let dot = match style.glyphs {
        Glyphs::Plain => "*",
        Glyphs::Pretty => "\u{25cf}",
    };
    let highlight = |s: String| match style.palette {
        Palette::Mono => s,
        Palette::Color => s.magenta().to_string(),
    };
    let mut out = String::from("\n");
    for c in contexts {
        let line = format!("{}: {}", c.name, c.dir_path);
        if c.name == active {
            out.push_str(&highlight(format!("{dot} {line}")));
        } else {
            out.push_str(&format!("  {line}"));
        }
        out.push('\n');
    }
    out.push_str(&format!("\nLegend: {}\n", highlight(format!("{dot} active context"))));
    out
}

/// Dated, underlined header placed on top of listings written to a file.
pub fn file_header(now: DateTime<Local>) -> String {
    let header = format!("TODO list at {}:", now.format("%A, %B %-d, %Y"));
    let underline = "-".repeat(header.chars().count());
    format!("{header}\n{underline}\n")
}
