use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task journal.
/// Configuration and workspaces live in ~/.todo or the directory given by --home.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Personal task journal CLI")]
pub struct Cli {
    /// Configuration root directory.
    #[arg(long, global = true, env = "TODO_HOME")]
    pub home: Option<PathBuf>,

    /// Use plain ASCII symbols.
    #[arg(long, global = true)]
    pub plain: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Runs the configured default command when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
