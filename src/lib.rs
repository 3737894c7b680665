//! # todo - personal task journal
//!
//! Tasks carry two identifiers: a short, recyclable *usage id* typed on the
//! command line, and a permanent *global id* derived from the creation date and
//! a checksum of the task. Tasks live in a journal, can be pinned on a board,
//! arranged in a parent/child tree, given a note file, and moved to an archive
//! with its own usage-id namespace.
//!
//! ## Quick Start
//!
//! ```bash
//! todo add Buy coffee beans
//! todo status --next 1
//! todo board --add 1
//! todo list --tree
//! todo delete --archive 1
//! ```
//!
//! Configuration and workspaces live in `~/.todo` (or `--home` / `TODO_HOME`).
//! Each context is a directory holding `journal.json`, `archive.json` and
//! `notes/`.

pub mod archive;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod identity;
pub mod journal;
pub mod notes;
pub mod render;
pub mod session;
pub mod task;
pub mod tree;

pub use error::{Error, Result};
