//! Core type definitions for the runtime
//!
//! These types provide strong typing for runtime primitives.

use core::fmt;

/// Task priority (lower value = more urgent)
pub type Priority = i32;

/// Tick counter type
pub type Tick = u64;

/// Quantum counter type
pub type Quantum = u32;

/// Value a task hands to its waiters when it exits
pub type ExitCode = i32;

/// Task identity
///
/// Identities are assigned in creation order and never reused. The value
/// doubles as the task's slot in the runtime's task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u32);

impl TaskId {
    /// The task that owns the original process context
    pub const BOOTSTRAP: TaskId = TaskId(0);
    /// The system task running the dispatch loop
    pub const DISPATCHER: TaskId = TaskId(1);

    /// Raw numeric identity
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a runtime-owned task queue used with `suspend`/`awake`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId(pub(crate) u32);

impl QueueId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Task is in the ready queue
    Ready = 0,
    /// Task owns the processor
    Running = 1,
    /// Task is parked in a queue other than the ready queue
    Suspended = 2,
    /// Task has exited; its exit code is valid
    Terminated = 3,
}

/// Accounting snapshot produced when a task exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskReport {
    pub id: TaskId,
    pub exit_code: ExitCode,
    /// Ticks between creation and exit
    pub lifetime: Tick,
    /// Ticks spent holding the processor
    pub processor_time: Tick,
    /// Number of times the dispatcher switched into the task
    pub activations: u32,
}

/// Diagnostic view of a task record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: TaskId,
    pub state: TaskState,
    pub static_prio: Priority,
    pub dynamic_prio: Priority,
    pub is_system: bool,
    pub quantum: Quantum,
    pub activations: u32,
    pub processor_time: Tick,
    pub exit_code: Option<ExitCode>,
}
