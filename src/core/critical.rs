//! Critical section handling for the runtime
//!
//! Runtime state is only touched inside a critical section, and a critical
//! section never spans a context switch. The tick handler runs on top of
//! the interrupted task, so it also observes state only through here.

pub use ::critical_section::CriticalSection;

/// Execute a closure inside a critical section
///
/// The closure receives the critical section token, which can be used to
/// access [`CsCell`](crate::core::cs_cell::CsCell) protected data.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    ::critical_section::with(f)
}
