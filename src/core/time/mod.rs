//! Time management module
//!
//! Provides the tick sources that drive preemption and the tick handler
//! that charges the running task's quantum.
//!
//! Ticks are the only notion of time inside the runtime. A tick source
//! only counts them; they are delivered to the runtime on the running
//! task's own flow, either one at a time through [`Runtime::tick`] or in
//! batches through [`Runtime::checkpoint`]. Every context switch and
//! every exit also takes the pending ticks and counts them for the task
//! leaving the processor, so they are never charged to the task that
//! runs next.

use alloc::boxed::Box;
use core::time::Duration;

use crate::error::OsResult;
use crate::kernel::Runtime;
use crate::types::{Quantum, Tick};

/// Timer service that produces preemption ticks
pub trait TickSource {
    /// Start producing one tick every `interval`
    fn arm(&mut self, interval: Duration) -> OsResult<()>;

    /// Take the ticks produced since the last call
    fn take_pending(&self) -> u32;
}

/// Tick source that never fires
///
/// Time only moves when tasks call [`Runtime::tick`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualTicks;

impl TickSource for ManualTicks {
    fn arm(&mut self, _interval: Duration) -> OsResult<()> {
        Ok(())
    }

    #[inline]
    fn take_pending(&self) -> u32 {
        0
    }
}

#[cfg(feature = "std")]
pub use ticker::ThreadTicker;

#[cfg(feature = "std")]
mod ticker {
    use alloc::sync::Arc;
    use core::time::Duration;
    use std::thread::JoinHandle;

    use portable_atomic::{AtomicBool, AtomicU32, Ordering};

    use super::TickSource;
    use crate::error::{OsError, OsResult};

    /// Tick source backed by a host thread
    ///
    /// The thread sleeps for one interval at a time and counts a tick
    /// after each sleep. It is stopped and joined on drop.
    #[derive(Debug, Default)]
    pub struct ThreadTicker {
        pending: Arc<AtomicU32>,
        stop: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl ThreadTicker {
        pub fn new() -> Self {
            Self::default()
        }

        /// Check if the ticker thread is running
        pub fn is_armed(&self) -> bool {
            self.handle.is_some()
        }
    }

    impl TickSource for ThreadTicker {
        fn arm(&mut self, interval: Duration) -> OsResult<()> {
            if interval.is_zero() {
                return Err(OsError::TimerArm);
            }
            if self.handle.is_some() {
                return Ok(());
            }

            let pending = Arc::clone(&self.pending);
            let stop = Arc::clone(&self.stop);

            let handle = std::thread::Builder::new()
                .name("ppos-ticker".into())
                .spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        std::thread::sleep(interval);
                        pending.fetch_add(1, Ordering::Relaxed);
                    }
                })
                .map_err(|_| OsError::TimerArm)?;

            self.handle = Some(handle);
            Ok(())
        }

        #[inline]
        fn take_pending(&self) -> u32 {
            self.pending.swap(0, Ordering::AcqRel)
        }
    }

    impl Drop for ThreadTicker {
        fn drop(&mut self) {
            self.stop.store(true, Ordering::Release);
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Tick source used when the builder is given none
pub(crate) fn default_tick_source() -> Box<dyn TickSource> {
    #[cfg(feature = "std")]
    {
        Box::new(ThreadTicker::new())
    }

    #[cfg(not(feature = "std"))]
    {
        Box::new(ManualTicks)
    }
}

impl Runtime {
    /// Deliver one tick to the running task
    ///
    /// Advances the tick counter and charges the running task's quantum.
    /// When the quantum runs out the task yields before this returns.
    pub fn tick(&self) {
        self.advance(1);
    }

    /// Deliver the ticks the tick source has produced since the last call
    ///
    /// This is the preemption point for tasks running under a real timer:
    /// call it from long-running loops.
    pub fn checkpoint(&self) {
        let pending = self.tick_source.take_pending();
        if pending > 0 {
            self.advance(pending);
        }
    }

    /// Count the pending ticks without charging any quantum
    ///
    /// Returns the tick counter after the update.
    pub(crate) fn settle_ticks(&self) -> Tick {
        match self.tick_source.take_pending() {
            0 => self.flags.tick_get(),
            pending => self.flags.tick_advance(Tick::from(pending)),
        }
    }

    /// Tick handler
    fn advance(&self, ticks: Quantum) {
        let now = self.flags.tick_advance(Tick::from(ticks));

        let expired = self.with_state(|st| {
            let tcb = st.current_tcb_mut();
            if tcb.is_system {
                return None;
            }
            tcb.quantum = tcb.quantum.saturating_sub(ticks);
            (tcb.quantum == 0).then_some(tcb.id)
        });

        if let Some(id) = expired {
            crate::trace!("task {} preempted at tick {}", id, now);
            self.yield_now();
        }
    }
}

