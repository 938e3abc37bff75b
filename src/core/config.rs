//! Configuration for the runtime
//!
//! The `CFG_*` constants are the compile-time defaults; [`RuntimeConfig`]
//! carries the values a particular runtime instance uses.

use core::time::Duration;

use crate::types::{ExitCode, Priority, Quantum};

/// Default task stack size in bytes
pub const CFG_STACK_SIZE: usize = 64 * 1024;

/// Minimum task stack size in bytes
pub const CFG_STACK_SIZE_MIN: usize = 16 * 1024;

/// Stack alignment required by the context switch
pub const CFG_STACK_ALIGN: usize = 16;

/// Ticks a task may run before it is preempted
pub const CFG_QUANTUM_TICKS: Quantum = 20;

/// Preemption timer interval in microseconds
pub const CFG_TICK_INTERVAL_US: u64 = 1000;

/// Priority given to new tasks
pub const CFG_PRIO_DEFAULT: Priority = 0;

/// Exit code reported for a task whose body panicked
pub const CFG_PANIC_EXIT_CODE: ExitCode = -1;

/// Per-runtime settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for every task created by the runtime
    pub stack_size: usize,
    /// Quantum granted on each dispatch
    pub quantum: Quantum,
    /// Interval handed to the tick source when it is armed
    pub tick_interval: Duration,
}

impl RuntimeConfig {
    pub const fn new() -> Self {
        Self {
            stack_size: CFG_STACK_SIZE,
            quantum: CFG_QUANTUM_TICKS,
            tick_interval: Duration::from_micros(CFG_TICK_INTERVAL_US),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
