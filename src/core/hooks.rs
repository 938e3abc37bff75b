//! Runtime hooks
//!
//! Optional collaborators the runtime calls out to: debug tooling that
//! wants to know which memory ranges are task stacks, observers of the
//! exit accounting, and the process teardown used when the runtime ends
//! with no context to return to.

use crate::types::{ExitCode, TaskReport};

/// Callbacks invoked by the runtime
///
/// Every method has a default. Hooks are called outside the runtime's
/// critical sections but must not call back into the runtime.
pub trait RuntimeHooks {
    /// A task stack spanning `base..base + len` was created
    ///
    /// The returned token is passed back to [`deregister_stack`](Self::deregister_stack).
    fn register_stack(&self, base: *const u8, len: usize) -> usize {
        let _ = (base, len);
        0
    }

    /// The stack registered under `token` is about to be freed
    fn deregister_stack(&self, token: usize) {
        let _ = token;
    }

    /// A task exited
    fn task_exited(&self, report: &TaskReport) {
        let _ = report;
    }

    /// The dispatcher ran out of work after the bootstrap task exited
    fn terminate(&self, code: ExitCode) -> ! {
        #[cfg(feature = "std")]
        {
            std::process::exit(code)
        }

        #[cfg(not(feature = "std"))]
        {
            let _ = code;
            loop {
                core::hint::spin_loop();
            }
        }
    }
}

/// Hooks that do nothing beyond the defaults
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl RuntimeHooks for DefaultHooks {}
