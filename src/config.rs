//! Configuration loading and management
//!
//! Handles the `config.json` file in the configuration root: the list of
//! contexts (one workspace directory each), the active context and the
//! display parameters.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{Glyphs, Palette, RenderStyle, DEFAULT_INDICATORS};

/// Base name of the configuration file inside the configuration root.
pub const CONFIG_FILENAME: &str = "config.json";
/// Name (and default relative path) of the context that always exists.
pub const DEFAULT_CONTEXT: &str = "default";
/// Journal file name inside a context directory.
pub const JOURNAL_FILENAME: &str = "journal.json";
/// Archive file name inside a context directory.
pub const ARCHIVE_FILENAME: &str = "archive.json";

/// `$HOME/.todo`, or `./.todo` when `HOME` is unset.
pub fn default_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".todo")
}

/// A named workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    /// Absolute, or relative to the configuration root.
    pub dir_path: String,
}

impl Context {
    pub fn new(name: impl Into<String>, dir_path: impl Into<String>) -> Self {
        Context {
            name: name.into(),
            dir_path: dir_path.into(),
        }
    }

    /// Workspace directory, resolved against `root` when relative.
    pub fn dir(&self, root: &Path) -> PathBuf {
        let p = Path::new(&self.dir_path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            root.join(p)
        }
    }

    pub fn journal_path(&self, root: &Path) -> PathBuf {
        self.dir(root).join(JOURNAL_FILENAME)
    }

    pub fn archive_path(&self, root: &Path) -> PathBuf {
        self.dir(root).join(ARCHIVE_FILENAME)
    }
}

/// Display and behavior parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Command run when no subcommand is given
    #[serde(default = "default_command")]
    pub default_command: String,

    #[serde(default = "default_true")]
    pub pretty_print: bool,

    #[serde(default = "default_true")]
    pub with_color: bool,

    /// Indicators template (`{date}`, `{note}`, `{board}`)
    #[serde(default = "default_indicators")]
    pub indicators: String,
}

fn default_command() -> String {
    "board".to_string()
}

fn default_true() -> bool {
    true
}

fn default_indicators() -> String {
    DEFAULT_INDICATORS.to_string()
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            default_command: default_command(),
            pretty_print: default_true(),
            with_color: default_true(),
            indicators: default_indicators(),
        }
    }
}

impl Parameters {
    /// Rendering capability, with the command-line overrides applied.
    pub fn render_style(&self, force_plain: bool, force_mono: bool) -> RenderStyle {
        let glyphs = if self.pretty_print && !force_plain {
            Glyphs::Pretty
        } else {
            Glyphs::Plain
        };
        let palette = if self.with_color && !force_mono {
            Palette::Color
        } else {
            Palette::Mono
        };
        RenderStyle::new(glyphs, palette).with_indicators(self.indicators.clone())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the active context
    #[serde(default = "default_context_name")]
    pub context_name: String,

    #[serde(default = "default_contexts")]
    pub contexts: Vec<Context>,

    #[serde(default)]
    pub parameters: Parameters,
}

fn default_context_name() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_contexts() -> Vec<Context> {
    vec![Context::new(DEFAULT_CONTEXT, DEFAULT_CONTEXT)]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_name: default_context_name(),
            contexts: default_contexts(),
            parameters: Parameters::default(),
        }
    }
}

impl Config {
    /// Load `config.json` from `root`, writing a default one if it is missing.
    pub fn load_or_init(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILENAME);
        if !path.exists() {
            let config = Config::default();
            config.save(root)?;
            debug!(path = %path.display(), "initialized configuration");
            return Ok(config);
        }
        let mut config: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if config.context(DEFAULT_CONTEXT).is_none() {
            config.contexts.insert(0, Context::new(DEFAULT_CONTEXT, DEFAULT_CONTEXT));
        }
        debug!(path = %path.display(), contexts = config.contexts.len(), "loaded configuration");
        Ok(config)
    }

    /// Write `config.json` into `root`, creating the directory if needed.
    pub fn save(&self, root: &Path) -> Result<()> {
        fs::create_dir_all(root)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(root.join(CONFIG_FILENAME), json)?;
        Ok(())
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// The active context.
    pub fn active(&self) -> Result<&Context> {
        self.context(&self.context_name)
            .ok_or_else(|| Error::ContextNotFound(self.context_name.clone()))
    }

    /// Append a new context. Fails if the name is taken.
    pub fn add_context(&mut self, context: Context) -> Result<()> {
        if self.context(&context.name).is_some() {
            return Err(Error::ContextExists(context.name));
        }
        self.contexts.push(context);
        Ok(())
    }

    /// Create `name`, or update its path if it exists, and make it active.
    /// Returns `true` when the context was created.
    pub fn upsert_context(&mut self, name: &str, dir_path: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("a context name cannot be empty".into()));
        }
        let created = match self.contexts.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                existing.dir_path = dir_path.to_string();
                false
            }
            None => {
                self.add_context(Context::new(name, dir_path))?;
                true
            }
        };
        self.context_name = name.to_string();
        Ok(created)
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        if self.context(name).is_none() {
            return Err(Error::ContextNotFound(name.to_string()));
        }
        self.context_name = name.to_string();
        Ok(())
    }

    /// Forget a context. Its workspace files stay on disk.
    pub fn remove_context(&mut self, name: &str) -> Result<Context> {
        if name == DEFAULT_CONTEXT {
            return Err(Error::InvalidArgument(
                "the default context can not be removed".into(),
            ));
        }
        let idx = self
            .contexts
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::ContextNotFound(name.to_string()))?;
        let removed = self.contexts.remove(idx);
        if self.context_name == name {
            self.context_name = DEFAULT_CONTEXT.to_string();
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_default_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_init(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILENAME).exists());
        assert_eq!(config.parameters.default_command, "board");
        assert_eq!(config.active().unwrap().name, DEFAULT_CONTEXT);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{"parameters": {"with_color": false}}"#,
        )
        .unwrap();
        let config = Config::load_or_init(dir.path()).unwrap();
        assert_eq!(config.context_name, DEFAULT_CONTEXT);
        assert!(!config.parameters.with_color);
        assert!(config.parameters.pretty_print);
        assert_eq!(config.parameters.indicators, DEFAULT_INDICATORS);
    }

    #[test]
    fn context_paths_resolve_against_root() {
        let root = Path::new("/home/me/.todo");
        let rel = Context::new("work", "work");
        assert_eq!(rel.journal_path(root), root.join("work").join("journal.json"));
        let abs = Context::new("lab", "/srv/lab");
        assert_eq!(abs.archive_path(root), PathBuf::from("/srv/lab/archive.json"));
    }

    #[test]
    fn upsert_creates_then_updates_and_selects() {
        let mut config = Config::default();
        assert!(config.upsert_context("work", "work").unwrap());
        assert_eq!(config.context_name, "work");
        assert!(!config.upsert_context("work", "/elsewhere").unwrap());
        assert_eq!(config.context("work").unwrap().dir_path, "/elsewhere");
        assert!(matches!(
            config.add_context(Context::new("work", "x")),
            Err(Error::ContextExists(_))
        ));
    }

    #[test]
    fn select_unknown_context_fails() {
        let mut config = Config::default();
        assert!(matches!(config.select("nope"), Err(Error::ContextNotFound(_))));
        assert_eq!(config.context_name, DEFAULT_CONTEXT);
    }

    #[test]
    fn removing_active_context_reselects_default() {
        let mut config = Config::default();
        config.upsert_context("work", "work").unwrap();
        let removed = config.remove_context("work").unwrap();
        assert_eq!(removed.name, "work");
        assert_eq!(config.context_name, DEFAULT_CONTEXT);
        assert!(matches!(
            config.remove_context(DEFAULT_CONTEXT),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(config.remove_context("work"), Err(Error::ContextNotFound(_))));
    }

    #[test]
    fn flags_override_display_parameters() {
        let params = Parameters::default();
        let style = params.render_style(false, false);
        assert_eq!((style.glyphs, style.palette), (Glyphs::Pretty, Palette::Color));
        let style = params.render_style(true, true);
        assert_eq!((style.glyphs, style.palette), (Glyphs::Plain, Palette::Mono));
    }
}
