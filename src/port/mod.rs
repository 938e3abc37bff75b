//! Port layer - CPU-specific implementations
//!
//! This module provides the execution context abstraction: a saved stack
//! pointer from which a suspended flow of control can be resumed. All
//! register-level work lives in the per-architecture modules; nothing
//! above this layer knows how a context is laid out.

use crate::stack::Stack;

#[cfg(all(target_arch = "x86_64", not(windows)))]
mod x86_64;

#[cfg(all(target_arch = "x86_64", not(windows)))]
use x86_64 as arch;

#[cfg(target_arch = "aarch64")]
mod aarch64;

#[cfg(target_arch = "aarch64")]
use aarch64 as arch;

#[cfg(not(any(all(target_arch = "x86_64", not(windows)), target_arch = "aarch64")))]
compile_error!("ppos supports x86_64 (System V) and aarch64 hosts only");

/// First function run on a fresh context; receives the `arg` given to
/// [`Context::create`] and must never return.
pub type ContextEntry = extern "C" fn(usize) -> !;

/// Saved execution context
#[derive(Debug)]
#[repr(C)]
pub struct Context {
    sp: usize,
}

impl Context {
    /// Context for the flow of control that is already running
    ///
    /// It holds nothing until the first [`swap`] away from it fills it in.
    pub const fn capture() -> Self {
        Context { sp: 0 }
    }

    /// Context that starts `entry(arg)` on `stack` when first switched to
    pub fn create(entry: ContextEntry, arg: usize, stack: &Stack) -> Self {
        // SAFETY: the stack is owned, writable and larger than one frame
        let sp = unsafe { arch::init_frame(stack.top(), entry, arg) };
        Context { sp }
    }

    /// Whether this context has ever been saved or built
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sp != 0
    }
}

/// Save the running flow into `from` and resume `to`
///
/// Returns when some other flow swaps back into `from`.
///
/// # Safety
/// `from` and `to` must be valid, distinct, and `to` must hold a context
/// that was created or previously saved and whose stack is still alive.
/// No reference into state shared with other contexts may be held across
/// the call.
#[inline]
pub unsafe fn swap(from: *mut Context, to: *const Context) {
    unsafe { arch::swap_context(&raw mut (*from).sp, (*to).sp) }
}
