//! Task Control Block (TCB) definition
//!
//! The TCB contains all the information needed to manage a task.

use alloc::boxed::Box;

use crate::config::CFG_PRIO_DEFAULT;
use crate::kernel::Runtime;
use crate::port::Context;
use crate::queue::{Linked, Links, Ring};
use crate::sched::SchedEntity;
use crate::stack::Stack;
use crate::types::{ExitCode, Priority, Quantum, TaskId, TaskInfo, TaskReport, TaskState, Tick};

/// Task body
pub(crate) type TaskEntry = Box<dyn FnOnce(&Runtime) -> ExitCode>;

/// Task Control Block
pub(crate) struct Tcb {
    // ============ Identity ============
    pub id: TaskId,
    pub state: TaskState,
    /// Exempt from quantum accounting
    pub is_system: bool,

    // ============ Priority ============
    pub static_prio: Priority,
    pub dynamic_prio: Priority,

    // ============ Queue links ============
    /// Membership links of whichever ring currently holds this task
    pub links: Links,
    /// Tasks blocked in `wait` on this task, owned by this task
    pub waiters: Ring,

    // ============ Execution ============
    /// Saved context; boxed so its address survives task table growth
    pub ctx: Box<Context>,
    /// Stack, `None` for the bootstrap task and after reclamation
    pub stack: Option<Stack>,
    /// Token handed back by the stack registration hook
    pub stack_token: Option<usize>,
    /// Body, taken on first run
    pub entry: Option<TaskEntry>,

    // ============ Time slicing ============
    pub quantum: Quantum,

    // ============ Accounting ============
    pub exit_code: Option<ExitCode>,
    pub created_at: Tick,
    pub sched_in: Tick,
    pub processor_time: Tick,
    pub activations: u32,
}

impl Tcb {
    pub fn new(id: TaskId, ctx: Context, now: Tick) -> Self {
        Tcb {
            id,
            state: TaskState::Ready,
            is_system: false,
            static_prio: CFG_PRIO_DEFAULT,
            dynamic_prio: CFG_PRIO_DEFAULT,
            links: Links::new(),
            waiters: Ring::new(),
            ctx: Box::new(ctx),
            stack: None,
            stack_token: None,
            entry: None,
            quantum: 0,
            exit_code: None,
            created_at: now,
            sched_in: now,
            processor_time: 0,
            activations: 0,
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.state == TaskState::Terminated
    }

    /// Set both priorities to `prio`
    #[inline]
    pub fn set_prio(&mut self, prio: Priority) {
        self.static_prio = prio;
        self.dynamic_prio = prio;
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            state: self.state,
            static_prio: self.static_prio,
            dynamic_prio: self.dynamic_prio,
            is_system: self.is_system,
            quantum: self.quantum,
            activations: self.activations,
            processor_time: self.processor_time,
            exit_code: self.exit_code,
        }
    }

    /// Exit accounting, charging the running slice up to `now`
    pub fn report(&self, exit_code: ExitCode, now: Tick) -> TaskReport {
        TaskReport {
            id: self.id,
            exit_code,
            lifetime: now.saturating_sub(self.created_at),
            processor_time: self.processor_time + now.saturating_sub(self.sched_in),
            activations: self.activations,
        }
    }
}

impl Linked for Tcb {
    #[inline]
    fn links(&self) -> &Links {
        &self.links
    }

    #[inline]
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

impl SchedEntity for Tcb {
    #[inline]
    fn static_prio(&self) -> Priority {
        self.static_prio
    }

    #[inline]
    fn dynamic_prio(&self) -> Priority {
        self.dynamic_prio
    }

    #[inline]
    fn set_dynamic_prio(&mut self, prio: Priority) {
        self.dynamic_prio = prio;
    }
}
