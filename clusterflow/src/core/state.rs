//! Run states reported by jobs, pipeline instances and their components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lifecycle state of a runnable record.
///
/// Records carry the state as a free-form string; values outside this set
/// parse to `None` and are treated as "still running".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Created, inputs not yet complete.
    New,
    /// Inputs complete, waiting to be started.
    Ready,
    /// Pipeline driven by the server-side runner.
    RunningOnServer,
    /// Pipeline driven by a client-side runner.
    RunningOnClient,
    /// Waiting in a queue for resources.
    Queued,
    /// Currently running.
    Running,
    /// Paused by a user.
    Paused,
    /// Finished successfully.
    Complete,
    /// Finished unsuccessfully.
    Failed,
    /// Stopped before finishing.
    Cancelled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Ready => write!(f, "Ready"),
            Self::RunningOnServer => write!(f, "RunningOnServer"),
            Self::RunningOnClient => write!(f, "RunningOnClient"),
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Paused => write!(f, "Paused"),
            Self::Complete => write!(f, "Complete"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for RunState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Ready" => Ok(Self::Ready),
            "RunningOnServer" => Ok(Self::RunningOnServer),
            "RunningOnClient" => Ok(Self::RunningOnClient),
            "Queued" => Ok(Self::Queued),
            "Running" => Ok(Self::Running),
            "Paused" => Ok(Self::Paused),
            "Complete" => Ok(Self::Complete),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

impl RunState {
    /// Parses a state string, returning `None` for unrecognized values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Returns true if the state will not change again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the state indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns true if the state indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }

    /// The tri-state outcome: `Some(true)` succeeded, `Some(false)` failed,
    /// `None` not finished.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        if self.is_success() {
            Some(true)
        } else if self.is_failure() {
            Some(false)
        } else {
            None
        }
    }
}
