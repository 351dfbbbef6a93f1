//! Thread-state data models.
//!
//! A `ThreadState` is one scheduling interval `[ts, ts + dur)` of one thread.
//! Intervals belonging to the same thread never overlap.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::thread::ThreadInfo;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ThreadStateId(pub i64);

impl fmt::Display for ThreadStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique thread id within a trace (tids can be reused, utids cannot).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Utid(pub i64);

impl fmt::Display for Utid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SchedId(pub i64);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadState {
    pub id: ThreadStateId,
    /// Start timestamp in nanoseconds.
    pub ts: i64,
    /// Duration in nanoseconds.
    pub dur: i64,
    pub utid: Utid,
    pub state: String,
    /// Only set while the thread is running.
    pub cpu: Option<u32>,
    /// Scheduling slice backing a running state; present only with `cpu`.
    pub sched_id: Option<SchedId>,
    pub priority: Option<i32>,
    pub blocked_function: Option<String>,
    pub waker_id: Option<ThreadStateId>,
    /// `None` on traces recorded before interrupt context was captured.
    pub waker_interrupt_ctx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadInfo>,
}

impl ThreadState {
    pub fn end_ts(&self) -> i64 {
        self.ts.saturating_add(self.dur)
    }

    pub fn is_running(&self, running_state: &str) -> bool {
        self.state == running_state
    }

    /// Whether this interval was woken by a thread rather than an interrupt.
    /// An absent flag counts as non-interrupt.
    pub fn woken_outside_interrupt(&self) -> bool {
        !self.waker_interrupt_ctx.unwrap_or(false)
    }
}

/// Human readable name for a scheduler state code.
///
/// Unknown codes are returned verbatim; an empty code has no description.
pub fn describe_state(code: &str) -> Option<String> {
    let name = match code {
        "" => return None,
        "Running" => "Running",
        "R" => "Runnable",
        "R+" => "Runnable (Preempted)",
        "S" => "Sleeping",
        "D" => "Uninterruptible Sleep",
        "T" => "Stopped",
        "t" => "Traced",
        "X" => "Exit (Dead)",
        "Z" => "Exit (Zombie)",
        "x" => "Task Dead",
        "I" => "Idle",
        "K" => "Wakekill",
        "W" => "Waking",
        "P" => "Parked",
        "N" => "No Load",
        other => other,
    };
    Some(name.to_string())
}
