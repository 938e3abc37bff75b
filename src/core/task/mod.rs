//! Task management module
//!
//! Provides task creation and the voluntary suspension points: yield,
//! suspend into a caller-supplied queue, and awake from it.

mod tcb;

pub(crate) use tcb::{TaskEntry, Tcb};

use alloc::boxed::Box;

use crate::error::{OsError, OsResult};
use crate::kernel::Runtime;
use crate::port::Context;
use crate::stack::Stack;
use crate::types::{ExitCode, Priority, QueueId, TaskId, TaskState};

impl Runtime {
    /// Create a task running `entry`
    ///
    /// The task gets its own stack, default priority and an empty waiting
    /// set, and is appended to the ready queue. Returning from `entry` is
    /// the same as calling [`exit`](Runtime::exit) with the returned code.
    ///
    /// The stack is freed when the task terminates, but its record stays in
    /// the task table for the life of the runtime so that its exit code and
    /// [`task_info`](Runtime::task_info) remain readable. A runtime that
    /// spawns tasks without bound grows by one record per task.
    ///
    /// # Returns
    /// * `Ok(TaskId)` - Identity of the new task
    /// * `Err(OsError::StkAlloc)` - Stack allocation failed; nothing was created
    ///
    /// # Example
    /// ```ignore
    /// let rt = ppos::Runtime::init()?;
    /// let worker = rt.spawn(|rt| {
    ///     rt.yield_now();
    ///     7
    /// })?;
    /// assert_eq!(rt.wait(worker), Ok(7));
    /// ```
    pub fn spawn<F>(&self, entry: F) -> OsResult<TaskId>
    where
        F: FnOnce(&Runtime) -> ExitCode + 'static,
    {
        let stack = Stack::new(self.config.stack_size)?;
        let ctx = Context::create(task_entry, self as *const Runtime as usize, &stack);
        let token = self.hooks.register_stack(stack.base(), stack.size());
        let now = self.flags.tick_get();

        let result = self.with_state(|st| {
            let id = st.next_id();
            let mut tcb = Tcb::new(id, ctx, now);
            tcb.stack = Some(stack);
            tcb.stack_token = Some(token);
            tcb.entry = Some(Box::new(entry) as TaskEntry);
            st.tasks.push(tcb);

            if let Err(err) = st.make_ready(id) {
                // A fresh record cannot be linked anywhere yet
                st.tasks.pop();
                return Err(err);
            }
            Ok(id)
        });

        match result {
            Ok(id) => {
                crate::debug!("task {} created", id);
                Ok(id)
            }
            Err(err) => {
                crate::error!("task creation failed: {:?}", err);
                self.hooks.deregister_stack(token);
                Err(err)
            }
        }
    }

    /// Give up the processor and go back to the ready queue
    ///
    /// Also reached from the tick handler when the running task's quantum
    /// is exhausted. Has no effect when called from a system task.
    pub fn yield_now(&self) {
        let queued = self.with_state(|st| {
            let cur = st.current;
            if st.current_tcb_mut().is_system {
                return Err(OsError::TaskSystem);
            }
            st.make_ready(cur)
        });

        match queued {
            Ok(()) => self.enter_dispatcher(),
            Err(OsError::TaskSystem) => {}
            Err(err) => crate::error!("yield failed to requeue task {}: {:?}", self.id(), err),
        }
    }

    /// Park the running task in `queue` until some other task awakes it
    ///
    /// # Returns
    /// * `Ok(())` - The task was awoken
    /// * `Err(OsError::Queue(_))` - The task could not be linked into `queue`
    /// * `Err(OsError::TaskSystem)` - Called from a system task
    /// * `Err(OsError::Deadlock)` - The ready queue drained while parked
    pub fn suspend(&self, queue: QueueId) -> OsResult<()> {
        let cur = self.with_state(|st| {
            let cur = st.current;
            if st.current_tcb_mut().is_system {
                return Err(OsError::TaskSystem);
            }
            st.queue_append(queue, cur)?;
            st.current_tcb_mut().state = TaskState::Suspended;
            Ok(cur)
        })?;

        self.enter_dispatcher();

        // Only a drained ready queue hands control back while still linked
        self.with_state(|st| {
            if st.queue_contains(queue, cur) {
                st.queue_remove(queue, cur)?;
                return Err(OsError::Deadlock);
            }
            Ok(())
        })
    }

    /// Move `task` from `queue` to the ready queue
    ///
    /// Never switches context; the awoken task runs when the dispatcher
    /// next picks it.
    ///
    /// # Returns
    /// * `Err(OsError::TaskNotExist)` - No such task
    /// * `Err(OsError::Queue(QueueError::NotFound))` - `task` is not in `queue`
    pub fn awake(&self, task: TaskId, queue: QueueId) -> OsResult<()> {
        self.with_state(|st| {
            st.tcb(task)?;
            st.queue_remove(queue, task)?;
            st.make_ready(task)
        })
    }

    /// Set the static priority of `task`, or of the running task for `None`
    ///
    /// The dynamic priority restarts from the new value. Tasks already in
    /// the ready queue keep their position.
    pub fn set_priority(&self, task: Option<TaskId>, prio: Priority) -> OsResult<()> {
        self.with_state(|st| {
            let id = task.unwrap_or(st.current);
            let tcb = st.tcb_mut(id)?;
            if tcb.is_system {
                return Err(OsError::TaskSystem);
            }
            tcb.set_prio(prio);
            Ok(())
        })
    }

    /// Static priority of `task`, or of the running task for `None`
    pub fn get_priority(&self, task: Option<TaskId>) -> OsResult<Priority> {
        self.with_state(|st| {
            let id = task.unwrap_or(st.current);
            st.tcb(id).map(|tcb| tcb.static_prio)
        })
    }

    /// Hand the processor to the dispatcher until the ready queue drains
    ///
    /// Only the bootstrap task may call this. The bootstrap task is parked
    /// outside every queue while the other tasks run, and resumes here
    /// once there is nothing left to dispatch.
    pub fn run(&self) -> OsResult<()> {
        self.with_state(|st| {
            if st.current != TaskId::BOOTSTRAP {
                return Err(OsError::NotBootstrap);
            }
            st.current_tcb_mut().state = TaskState::Suspended;
            Ok(())
        })?;

        self.enter_dispatcher();
        Ok(())
    }

    /// Switch to the dispatcher from a task that has already chosen its state
    pub(crate) fn enter_dispatcher(&self) {
        if let Err(err) = self.switch(TaskId::DISPATCHER) {
            crate::error!("switch to dispatcher failed: {:?}", err);
        }
    }

    /// Take the body of the running task for its first run
    fn take_entry(&self) -> Option<TaskEntry> {
        self.with_state(|st| st.current_tcb_mut().entry.take())
    }
}

/// First function run on every task context
pub(crate) extern "C" fn task_entry(arg: usize) -> ! {
    // SAFETY: `arg` is the address of the pinned runtime that created the
    // context, and the runtime outlives all of its tasks
    let rt = unsafe { &*(arg as *const Runtime) };

    let code = match rt.take_entry() {
        Some(entry) => run_entry(rt, entry),
        None => 0,
    };

    rt.exit(code)
}

#[cfg(feature = "std")]
fn run_entry(rt: &Runtime, entry: TaskEntry) -> ExitCode {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    match catch_unwind(AssertUnwindSafe(|| entry(rt))) {
        Ok(code) => code,
        Err(_) => {
            crate::error!("task {} panicked", rt.id());
            crate::config::CFG_PANIC_EXIT_CODE
        }
    }
}

#[cfg(not(feature = "std"))]
fn run_entry(rt: &Runtime, entry: TaskEntry) -> ExitCode {
    entry(rt)
}
