//! Task join protocol
//!
//! A task blocks in [`Runtime::wait`] on another task's waiting set and is
//! made ready again, with the exit code already stored, when that task
//! calls [`Runtime::exit`].

use crate::config::CFG_PANIC_EXIT_CODE;
use crate::error::{OsError, OsResult};
use crate::kernel::Runtime;
use crate::types::{ExitCode, TaskId, TaskState};

impl Runtime {
    /// Terminate the running task with `code`
    ///
    /// Every task waiting on the caller becomes ready, in the order it
    /// started waiting. The stack is released by the dispatcher once it
    /// regains the processor. Called from the dispatcher itself, this ends
    /// the runtime through [`RuntimeHooks::terminate`](crate::hooks::RuntimeHooks::terminate).
    ///
    /// Locals of the calling task are not dropped.
    pub fn exit(&self, code: ExitCode) -> ! {
        let now = self.settle_ticks();

        let report = self.with_state(|st| {
            let tcb = st.current_tcb_mut();
            if tcb.is_system {
                return None;
            }
            tcb.exit_code = Some(code);
            Some(tcb.report(code, now))
        });

        let Some(report) = report else {
            crate::info!("dispatcher exiting with code {}", code);
            self.hooks.terminate(code);
        };

        crate::info!(
            "task {} exit: code {}, lifetime {} ticks, processor {} ticks, {} activations",
            report.id,
            report.exit_code,
            report.lifetime,
            report.processor_time,
            report.activations
        );
        self.hooks.task_exited(&report);

        self.with_state(|st| {
            let cur = st.current;
            while let Some(waiter) = st.waiters_pop(cur) {
                if let Err(err) = st.make_ready(waiter) {
                    crate::error!("waiter {} of task {} lost: {:?}", waiter, cur, err);
                }
            }
            st.current_tcb_mut().state = TaskState::Terminated;
        });

        self.enter_dispatcher();

        // Terminated tasks are never switched back to
        crate::error!("terminated task {} resumed", report.id);
        self.hooks.terminate(CFG_PANIC_EXIT_CODE)
    }

    /// Block until `target` exits and return its exit code
    ///
    /// # Returns
    /// * `Ok(code)` - The code `target` passed to `exit`
    /// * `Err(OsError::TaskNotExist)` - No such task
    /// * `Err(OsError::TaskWaitSelf)` - `target` is the caller
    /// * `Err(OsError::TaskSystem)` - `target` or the caller is a system task
    /// * `Err(OsError::TaskTerminated)` - `target` already exited; its code is gone
    /// * `Err(OsError::Deadlock)` - The ready queue drained before `target` exited
    pub fn wait(&self, target: TaskId) -> OsResult<ExitCode> {
        let cur = self.with_state(|st| {
            let cur = st.current;
            let (target_system, target_done) =
                st.tcb(target).map(|tcb| (tcb.is_system, tcb.is_terminated()))?;
            if target == cur {
                return Err(OsError::TaskWaitSelf);
            }
            if target_system || st.current_tcb_mut().is_system {
                return Err(OsError::TaskSystem);
            }
            if target_done {
                return Err(OsError::TaskTerminated);
            }

            st.waiters_append(target, cur)?;
            st.current_tcb_mut().state = TaskState::Suspended;
            Ok(cur)
        })?;

        self.enter_dispatcher();

        self.with_state(|st| {
            let (done, code) = st.tcb(target).map(|tcb| (tcb.is_terminated(), tcb.exit_code))?;
            match code {
                Some(code) if done => Ok(code),
                _ => {
                    crate::warn!("task {} handed back while waiting on task {}", cur, target);
                    st.waiters_remove(target, cur)?;
                    Err(OsError::Deadlock)
                }
            }
        })
    }
}
