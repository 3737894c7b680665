use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use task_journal::cli::Cli;
use task_journal::cmd;
use task_journal::config::default_home;
use task_journal::error::exit_codes;
use task_journal::session::Session;
use task_journal::Result;

fn main() {
    // Tracing is opt-in via RUST_LOG and goes to stderr.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("ERR: {err}");
        std::process::exit(err.exit_code());
    }
    std::process::exit(exit_codes::SUCCESS);
}

fn run(cli: Cli) -> Result<()> {
    let home = cli.home.unwrap_or_else(default_home);
    let mut session = Session::open(home, cli.plain, cli.no_color)?;
    let command = match cli.command {
        Some(command) => command,
        None => cmd::default_command(&session.config.parameters.default_command)?,
    };
    cmd::run(&mut session, command)
}
