//! Runtime state and initialization
//!
//! This module owns the process-wide pieces of a runtime instance: the task
//! table, the ready queue, the user queues, the current-task pointer and
//! the tick counter. Nothing here is global; every runtime is an
//! independent value and several can coexist on different threads.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::marker::PhantomPinned;
use core::pin::Pin;
use core::time::Duration;

use portable_atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::RuntimeConfig;
use crate::core::cs_cell::CsCell;
use crate::critical::critical_section;
use crate::error::{OsError, OsResult, QueueError};
use crate::hooks::{DefaultHooks, RuntimeHooks};
use crate::port::{self, Context};
use crate::queue::Ring;
use crate::stack::Stack;
use crate::task::{task_entry, Tcb};
use crate::time::TickSource;
use crate::types::{ExitCode, QueueId, TaskId, TaskInfo, TaskState, Tick};

// ============ Runtime Flags ============

/// Atomic runtime flags
pub(crate) struct RuntimeFlags {
    dispatching: AtomicBool,
    tick_counter: AtomicU64,
}

impl RuntimeFlags {
    const fn new() -> Self {
        Self {
            dispatching: AtomicBool::new(false),
            tick_counter: AtomicU64::new(0),
        }
    }

    /// Check if the dispatcher has been started
    #[inline(always)]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn set_dispatching(&self, val: bool) {
        self.dispatching.store(val, Ordering::Release);
    }

    /// Get current tick count
    #[inline(always)]
    pub fn tick_get(&self) -> Tick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    /// Advance the tick count and return the new value
    #[inline(always)]
    pub fn tick_advance(&self, ticks: Tick) -> Tick {
        self.tick_counter.fetch_add(ticks, Ordering::Relaxed) + ticks
    }
}

// ============ Runtime State ============

/// Mutable runtime state, only reachable inside a critical section
pub(crate) struct RuntimeState {
    /// Task table, indexed by task id
    pub tasks: Vec<Tcb>,
    /// Tasks eligible for dispatch
    pub ready: Ring,
    /// Caller-supplied queues for `suspend`/`awake`
    pub queues: Vec<Ring>,
    /// Task holding the processor
    pub current: TaskId,
}

impl RuntimeState {
    #[inline]
    pub fn tcb(&self, id: TaskId) -> OsResult<&Tcb> {
        self.tasks.get(id.index()).ok_or(OsError::TaskNotExist)
    }

    #[inline]
    pub fn tcb_mut(&mut self, id: TaskId) -> OsResult<&mut Tcb> {
        self.tasks.get_mut(id.index()).ok_or(OsError::TaskNotExist)
    }

    #[inline]
    pub fn current_tcb_mut(&mut self) -> &mut Tcb {
        let idx = self.current.index();
        &mut self.tasks[idx]
    }

    /// Mark `id` ready and append it to the ready queue
    pub fn make_ready(&mut self, id: TaskId) -> OsResult<()> {
        let Self { tasks, ready, .. } = self;
        ready.append(tasks, id.index())?;
        tasks[id.index()].state = TaskState::Ready;
        Ok(())
    }

    pub fn queue_append(&mut self, queue: QueueId, id: TaskId) -> OsResult<()> {
        let Self { tasks, queues, .. } = self;
        let ring = queues.get_mut(queue.index()).ok_or(QueueError::NullQueue)?;
        ring.append(tasks, id.index())?;
        Ok(())
    }

    pub fn queue_remove(&mut self, queue: QueueId, id: TaskId) -> OsResult<()> {
        let Self { tasks, queues, .. } = self;
        let ring = queues.get_mut(queue.index()).ok_or(QueueError::NullQueue)?;
        ring.remove(tasks, id.index())?;
        Ok(())
    }

    pub fn queue_contains(&self, queue: QueueId, id: TaskId) -> bool {
        self.queues
            .get(queue.index())
            .is_some_and(|ring| ring.contains(&self.tasks, id.index()))
    }

    /// Append `id` to the waiting set owned by `target`
    pub fn waiters_append(&mut self, target: TaskId, id: TaskId) -> OsResult<()> {
        let mut ring = self.tcb(target)?.waiters;
        let result = ring.append(&mut self.tasks, id.index());
        self.tasks[target.index()].waiters = ring;
        result.map_err(OsError::from)
    }

    pub fn waiters_remove(&mut self, target: TaskId, id: TaskId) -> OsResult<()> {
        let mut ring = self.tcb(target)?.waiters;
        let result = ring.remove(&mut self.tasks, id.index());
        self.tasks[target.index()].waiters = ring;
        result.map_err(OsError::from)
    }

    /// Unlink and return the first waiter of `target`
    pub fn waiters_pop(&mut self, target: TaskId) -> Option<TaskId> {
        let mut ring = self.tasks.get(target.index())?.waiters;
        let popped = ring.pop_front(&mut self.tasks);
        self.tasks[target.index()].waiters = ring;
        popped.map(|idx| TaskId(idx as u32))
    }

    /// Id the next created task will receive
    #[inline]
    pub fn next_id(&self) -> TaskId {
        TaskId(self.tasks.len() as u32)
    }
}

// ============ Runtime ============

/// A task runtime instance
///
/// The runtime is pinned because every task context holds its address.
/// The thread that builds it becomes the bootstrap task.
///
/// Dropping the runtime frees the stacks of tasks still parked on them
/// without unwinding those tasks; whatever they own is leaked.
pub struct Runtime {
    pub(crate) state: CsCell<RuntimeState>,
    pub(crate) flags: RuntimeFlags,
    pub(crate) config: RuntimeConfig,
    pub(crate) tick_source: Box<dyn TickSource>,
    pub(crate) hooks: Box<dyn RuntimeHooks>,
    _pin: PhantomPinned,
}

impl Runtime {
    /// Initialize a runtime with the default configuration
    ///
    /// This is shorthand for `Runtime::builder().build()`.
    ///
    /// # Returns
    /// * `Err(OsError::TimerArm)` - The preemption timer could not be armed
    /// * `Err(OsError::StkAlloc)` - The dispatcher stack could not be allocated
    pub fn init() -> OsResult<Pin<Box<Runtime>>> {
        RuntimeBuilder::new().build()
    }

    /// Start configuring a runtime
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Run `f` with exclusive access to the runtime state
    ///
    /// Never call this re-entrantly and never switch contexts inside `f`.
    #[inline]
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut RuntimeState) -> R) -> R {
        // SAFETY: the borrow is confined to the closure and the runtime is
        // single-threaded; no context switch happens while it is alive
        critical_section(|cs| f(unsafe { self.state.get(cs) }))
    }

    /// Hand the processor to `target`
    ///
    /// The calling task is recorded as previous, `target` becomes current
    /// and RUNNING, and the previous task is charged for the ticks since it
    /// was last switched in. Returns once some other task switches back.
    ///
    /// Ticks the tick source produced since the last delivery belong to
    /// the previous task and are counted before it is charged.
    pub(crate) fn switch(&self, target: TaskId) -> OsResult<()> {
        let now = self.settle_ticks();

        let contexts = self.with_state(|st| {
            let next = st.tasks.get(target.index()).ok_or(OsError::TaskInvalid)?;
            if next.is_terminated() || (!next.ctx.is_valid() && target != st.current) {
                return Err(OsError::TaskInvalid);
            }

            let prev = st.current;
            if prev == target {
                st.current_tcb_mut().state = TaskState::Running;
                return Ok(None);
            }

            st.current = target;

            let prev_tcb = &mut st.tasks[prev.index()];
            prev_tcb.processor_time += now.saturating_sub(prev_tcb.sched_in);
            if prev_tcb.state == TaskState::Running {
                // Switched away without choosing a state: parked
                prev_tcb.state = TaskState::Suspended;
            }
            let from: *mut Context = &mut *prev_tcb.ctx;

            let next_tcb = &mut st.tasks[target.index()];
            next_tcb.state = TaskState::Running;
            next_tcb.sched_in = now;
            let to: *const Context = &*next_tcb.ctx;

            Ok(Some((prev, from, to)))
        })?;

        if let Some((prev, from, to)) = contexts {
            crate::trace!("switch {} -> {}", prev, target);
            // SAFETY: both contexts are boxed inside live task records, which
            // are never removed from the table; the state borrow has ended
            unsafe { port::swap(from, to) };
        }

        Ok(())
    }

    // ============ Queries ============

    /// Identity of the running task
    pub fn id(&self) -> TaskId {
        self.with_state(|st| st.current)
    }

    /// Ticks delivered since the runtime was built
    #[inline]
    pub fn now(&self) -> Tick {
        self.flags.tick_get()
    }

    /// Number of tasks in the ready queue
    pub fn ready_len(&self) -> usize {
        self.with_state(|st| st.ready.size(&st.tasks))
    }

    /// Snapshot of a task record
    pub fn task_info(&self, id: TaskId) -> OsResult<TaskInfo> {
        self.with_state(|st| st.tcb(id).map(Tcb::info))
    }

    /// Check whether the dispatcher has run at least once
    #[inline]
    pub fn is_dispatching(&self) -> bool {
        self.flags.is_dispatching()
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ============ User queues ============

    /// Create an empty queue for use with `suspend`/`awake`
    pub fn queue_create(&self) -> QueueId {
        self.with_state(|st| {
            st.queues.push(Ring::new());
            QueueId((st.queues.len() - 1) as u32)
        })
    }

    /// Number of tasks parked in `queue`
    pub fn queue_len(&self, queue: QueueId) -> OsResult<usize> {
        self.with_state(|st| {
            st.queues
                .get(queue.index())
                .map(|ring| ring.size(&st.tasks))
                .ok_or(OsError::Queue(QueueError::NullQueue))
        })
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for tcb in state.tasks.iter_mut() {
            if let Some(token) = tcb.stack_token.take() {
                self.hooks.deregister_stack(token);
            }
        }
    }
}

// ============ Builder ============

/// Configures and builds a [`Runtime`]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    tick_source: Option<Box<dyn TickSource>>,
    hooks: Option<Box<dyn RuntimeHooks>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            tick_source: None,
            hooks: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Stack size for every task, in bytes
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = bytes;
        self
    }

    /// Quantum granted on each dispatch, in ticks
    pub fn quantum(mut self, ticks: u32) -> Self {
        self.config.quantum = ticks;
        self
    }

    /// Interval the tick source is armed with
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    /// Timer service delivering preemption ticks
    pub fn tick_source(mut self, source: impl TickSource + 'static) -> Self {
        self.tick_source = Some(Box::new(source));
        self
    }

    /// Debug-tooling and observability callbacks
    pub fn hooks(mut self, hooks: impl RuntimeHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Build the runtime
    ///
    /// The calling flow of control becomes the bootstrap task (RUNNING).
    /// The dispatcher task is created but not queued; it starts the first
    /// time the bootstrap task gives up the processor.
    ///
    /// # Returns
    /// * `Err(OsError::TimerArm)` - The preemption timer could not be armed
    /// * `Err(OsError::StkAlloc)` - The dispatcher stack could not be allocated
    /// * `Err(OsError::StkSizeInvalid)` - The configured stack size is too small
    pub fn build(self) -> OsResult<Pin<Box<Runtime>>> {
        let config = self.config;
        let hooks = self.hooks.unwrap_or_else(|| Box::new(DefaultHooks));
        let mut tick_source = self.tick_source.unwrap_or_else(crate::time::default_tick_source);

        if let Err(err) = tick_source.arm(config.tick_interval) {
            crate::error!("preemption timer could not be armed: {:?}", err);
            return Err(OsError::TimerArm);
        }

        let dispatcher_stack = Stack::new(config.stack_size)?;

        let mut bootstrap = Tcb::new(TaskId::BOOTSTRAP, Context::capture(), 0);
        bootstrap.state = TaskState::Running;
        bootstrap.quantum = config.quantum;

        let rt = Box::pin(Runtime {
            state: CsCell::new(RuntimeState {
                tasks: vec![bootstrap],
                ready: Ring::new(),
                queues: Vec::new(),
                current: TaskId::BOOTSTRAP,
            }),
            flags: RuntimeFlags::new(),
            config,
            tick_source,
            hooks,
            _pin: PhantomPinned,
        });

        // The dispatcher context needs the runtime's final address
        let arg = &*rt as *const Runtime as usize;
        let token = rt
            .hooks
            .register_stack(dispatcher_stack.base(), dispatcher_stack.size());

        let mut dispatcher = Tcb::new(
            TaskId::DISPATCHER,
            Context::create(task_entry, arg, &dispatcher_stack),
            0,
        );
        dispatcher.is_system = true;
        dispatcher.state = TaskState::Suspended;
        dispatcher.stack = Some(dispatcher_stack);
        dispatcher.stack_token = Some(token);
        dispatcher.entry = Some(Box::new(|rt: &Runtime| -> ExitCode { rt.dispatcher_main() }));

        rt.with_state(|st| st.tasks.push(dispatcher));

        crate::info!(
            "runtime initialized: stack {} bytes, quantum {} ticks",
            config.stack_size,
            config.quantum
        );

        Ok(rt)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
