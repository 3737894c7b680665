//! Per-invocation state: configuration, active context and rendering style.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, IntegrityIssue};
use crate::config::{Config, Context};
use crate::error::Result;
use crate::journal::Journal;
use crate::render::RenderStyle;

pub struct Session {
    home: PathBuf,
    pub config: Config,
    pub style: RenderStyle,
}

impl Session {
    /// Load (or initialize) the configuration in `home` and resolve the style.
    pub fn open(home: impl Into<PathBuf>, force_plain: bool, force_mono: bool) -> Result<Self> {
        let home = home.into();
        let config = Config::load_or_init(&home)?;
        let style = config.parameters.render_style(force_plain, force_mono);
        Ok(Session { home, config, style })
    }

    /// Configuration root directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(crate::config::CONFIG_FILENAME)
    }

    pub fn context(&self) -> Result<&Context> {
        self.config.active()
    }

    /// Journal of the active context, created empty if missing.
    pub fn open_journal(&self) -> Result<Journal> {
        let context = self.context()?;
        fs::create_dir_all(context.dir(&self.home))?;
        Journal::load_or_create(&context.journal_path(&self.home))
    }

    /// Archive of the active context, created empty if missing.
    pub fn open_archive(&self) -> Result<Journal> {
        let context = self.context()?;
        fs::create_dir_all(context.dir(&self.home))?;
        Journal::load_or_create(&context.archive_path(&self.home))
    }

    /// Journal and archive together, with their integrity issues.
    pub fn open_both(&self) -> Result<(Journal, Journal, Vec<IntegrityIssue>)> {
        let journal = self.open_journal()?;
        let archive = self.open_archive()?;
        let issues = archive::reconcile(&journal, &archive);
        Ok((journal, archive, issues))
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_creates_config_and_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path(), false, true).unwrap();
        assert!(session.config_path().exists());

        let mut journal = session.open_journal().unwrap();
        assert!(journal.is_empty());
        assert_eq!(journal.path(), dir.path().join("default").join("journal.json"));
        journal.create("first");
        journal.save().unwrap();

        let journal = session.open_journal().unwrap();
        assert_eq!(journal.len(), 1);
        let archive = session.open_archive().unwrap();
        assert_eq!(archive.path(), dir.path().join("default").join("archive.json"));
    }

    #[test]
    fn contexts_have_separate_journals() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path(), true, true).unwrap();
        let mut journal = session.open_journal().unwrap();
        journal.create("home chore");
        journal.save().unwrap();

        session.config.upsert_context("work", "work").unwrap();
        session.save_config().unwrap();
        let session = Session::open(dir.path(), true, true).unwrap();
        assert_eq!(session.context().unwrap().name, "work");
        assert!(session.open_journal().unwrap().is_empty());
    }
}
