//! Enumerations used to describe tasks.
//!
//! The status is the only ordered field of a task: a task moves forward from
//! `todo` to `doing` to `done` and may be walked back one step at a time.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Direction, Error, Result};

/// Task completion status. Persisted as the integers 0, 1 and 2.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    Todo,
    Doing,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Doing, Status::Done];
    pub const START: Status = Status::Todo;

    /// Short lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    /// The following status, or `InvalidTransition` on `Done`.
    pub fn next(self) -> Result<Status> {
        match self {
            Status::Todo => Ok(Status::Doing),
            Status::Doing => Ok(Status::Done),
            Status::Done => Err(Error::InvalidTransition {
                status: self,
                direction: Direction::Next,
            }),
        }
    }

    /// The preceding status, or `InvalidTransition` on `Todo`.
    pub fn previous(self) -> Result<Status> {
        match self {
            Status::Todo => Err(Error::InvalidTransition {
                status: self,
                direction: Direction::Previous,
            }),
            Status::Doing => Ok(Status::Todo),
            Status::Done => Ok(Status::Doing),
        }
    }

    pub fn advance(&mut self) -> Result<()> {
        *self = self.next()?;
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<()> {
        *self = self.previous()?;
        Ok(())
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::START
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.label() == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = Status::ALL.iter().map(|st| st.label()).collect();
                Error::InvalidArgument(format!(
                    "the status {s} is not defined (should be one of {})",
                    labels.join(", ")
                ))
            })
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Todo => 0,
            Status::Doing => 1,
            Status::Done => 2,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Todo),
            1 => Ok(Status::Doing),
            2 => Ok(Status::Done),
            other => Err(format!("unknown status code {other} (expected 0, 1 or 2)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_then_previous_is_identity_inside_the_range() {
        let doing = Status::Doing;
        assert_eq!(doing.next().unwrap().previous().unwrap(), doing);
        assert_eq!(doing.previous().unwrap().next().unwrap(), doing);
    }

    #[test]
    fn boundaries_reject_transitions() {
        assert!(matches!(
            Status::Done.next(),
            Err(Error::InvalidTransition { direction: Direction::Next, .. })
        ));
        assert!(matches!(
            Status::Todo.previous(),
            Err(Error::InvalidTransition { direction: Direction::Previous, .. })
        ));
    }

    #[test]
    fn advance_walks_the_whole_lifecycle() {
        let mut status = Status::default();
        status.advance().unwrap();
        status.advance().unwrap();
        assert_eq!(status, Status::Done);
        assert!(status.advance().is_err());
        assert_eq!(status, Status::Done);
        status.retreat().unwrap();
        assert_eq!(status, Status::Doing);
    }

    #[test]
    fn labels_parse_back() {
        for status in Status::ALL {
            assert_eq!(status.label().parse::<Status>().unwrap(), status);
        }
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Status::Doing).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Status>("2").unwrap(), Status::Done);
        assert!(serde_json::from_str::<Status>("7").is_err());
    }
}
