//! Dispatcher - the system task driving the scheduling loop

use crate::kernel::{Runtime, RuntimeState};
use crate::types::{TaskId, TaskState};

use super::pick;

impl Runtime {
    /// Body of the dispatcher task
    ///
    /// Dispatches until the ready queue drains, then hands the processor
    /// back to the bootstrap task. If the bootstrap task has already
    /// exited there is no context left to return to and the runtime
    /// terminates with the bootstrap's exit code.
    pub(crate) fn dispatcher_main(&self) -> ! {
        self.flags.set_dispatching(true);
        crate::info!("dispatcher started");

        loop {
            while self.dispatch() {}

            let (state, code) = self.with_state(|st| {
                let boot = &st.tasks[TaskId::BOOTSTRAP.index()];
                (boot.state, boot.exit_code)
            });

            if state == TaskState::Terminated {
                let code = code.unwrap_or(0);
                crate::info!("no tasks left, terminating with code {}", code);
                self.hooks.terminate(code);
            }

            crate::debug!("ready queue drained, returning to task {}", TaskId::BOOTSTRAP);
            if let Err(err) = self.switch(TaskId::BOOTSTRAP) {
                crate::error!("handback to bootstrap failed: {:?}", err);
                self.hooks.terminate(crate::config::CFG_PANIC_EXIT_CODE);
            }
        }
    }

    /// Run one scheduling round
    ///
    /// Returns `false` once the ready queue is empty.
    fn dispatch(&self) -> bool {
        let quantum = self.config.quantum;

        let picked = self.with_state(|st| {
            let RuntimeState { tasks, ready, .. } = st;
            let idx = pick(ready, tasks)?;
            if let Err(err) = ready.remove(tasks, idx) {
                crate::error!("ready queue corrupted at slot {}: {:?}", idx, err);
                return None;
            }

            let tcb = &mut tasks[idx];
            tcb.quantum = quantum;
            tcb.activations += 1;
            Some(tcb.id)
        });

        let Some(next) = picked else {
            return false;
        };

        if let Err(err) = self.switch(next) {
            crate::error!("dispatch of task {} failed: {:?}", next, err);
            return true;
        }

        // Back on the dispatcher: the task yielded, parked or exited
        let terminated = self.with_state(|st| {
            st.tcb(next).map(|tcb| tcb.is_terminated()).unwrap_or(false)
        });
        if terminated {
            self.reclaim(next);
        }

        true
    }

    /// Release the stack of a terminated task
    fn reclaim(&self, id: TaskId) {
        let taken = self.with_state(|st| {
            st.tcb_mut(id)
                .map(|tcb| (tcb.stack.take(), tcb.stack_token.take()))
                .ok()
        });

        if let Some((stack, token)) = taken {
            if let Some(token) = token {
                self.hooks.deregister_stack(token);
            }
            drop(stack);
            crate::trace!("task {} stack released", id);
        }
    }
}
