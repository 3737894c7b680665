//! Task data structure.
//!
//! This module defines the `Task` record stored in a journal or an archive, in
//! the exact shape it takes inside the persisted JSON file.

use serde::{Deserialize, Serialize};

use crate::fields::Status;
use crate::identity::{compute_global_id, TaskId, NO_PARENT};

/// A single unit of work.
///
/// `usage_id` is unique within its collection and may be recycled;
/// `global_id` is computed once at creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "UIndex")]
    pub usage_id: TaskId,
    #[serde(rename = "GIndex")]
    pub global_id: TaskId,
    /// Creation time, unix seconds.
    #[serde(rename = "Timestamp")]
    pub created_at: i64,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Status", default)]
    pub status: Status,
    #[serde(rename = "OnBoard", default)]
    pub on_board: bool,
    /// Note file path relative to the journal directory; empty means no note.
    #[serde(rename = "NotePath", default)]
    pub note_path: String,
    #[serde(rename = "ParentID", default)]
    pub parent_id: TaskId,
}

impl Task {
    /// Build a fresh `Todo` task and derive its global id.
    pub fn new(usage_id: TaskId, description: impl Into<String>, created_at: i64) -> Self {
        let description = description.into();
        let global_id = compute_global_id(usage_id, created_at, &description);
        Task {
            usage_id,
            global_id,
            created_at,
            description,
            status: Status::Todo,
            on_board: false,
            note_path: String::new(),
            parent_id: NO_PARENT,
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent_id != NO_PARENT
    }

    pub fn has_note(&self) -> bool {
        !self.note_path.is_empty()
    }
}
