//! Green-thread runtime
//!
//! Multiplexes independently scheduled tasks onto the calling thread:
//! - Priority scheduling with aging, so no ready task starves
//! - Quantum-based preemption driven by a tick source
//! - Join on task exit with exit codes
//! - Context switching for x86_64 (System V) and AArch64
//!
//! ```ignore
//! let rt = ppos::Runtime::init()?;
//! let worker = rt.spawn(|_| 7)?;
//! rt.set_priority(Some(worker), -5)?;
//! assert_eq!(rt.wait(worker), Ok(7));
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ============ Modules ============

pub mod log;

pub mod core;
pub mod sync;
pub mod port;

// ============ Re-exports ============

pub use self::core::config;
pub use self::core::config::*;
pub use self::core::critical;
pub use self::core::error;
pub use self::core::error::{OsError, OsResult, QueueError, QueueResult};
pub use self::core::hooks;
pub use self::core::hooks::{DefaultHooks, RuntimeHooks};
pub use self::core::kernel;
pub use self::core::kernel::{Runtime, RuntimeBuilder};
pub use self::core::queue;
pub use self::core::sched;
pub use self::core::stack;
pub use self::core::task;
pub use self::core::time;
pub use self::core::time::{ManualTicks, TickSource};
#[cfg(feature = "std")]
pub use self::core::time::ThreadTicker;
pub use self::core::types;
pub use self::core::types::*;
