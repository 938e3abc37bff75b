//! Critical section protected cell
//!
//! Wrapper for runtime state that must be accessed within critical sections.

use core::cell::UnsafeCell;

use crate::critical::CriticalSection;

/// A cell that can only be accessed within a critical section.
pub struct CsCell<T>(UnsafeCell<T>);

impl<T> CsCell<T> {
    /// Create a new CsCell
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Get a mutable reference to the inner value
    ///
    /// # Safety
    /// The returned reference must not outlive the critical section, and no
    /// other reference obtained from this cell may be alive at the same time.
    #[inline(always)]
    pub unsafe fn get<'cs>(&'cs self, _cs: CriticalSection<'cs>) -> &'cs mut T {
        unsafe { &mut *self.0.get() }
    }

    /// Get a mutable reference through exclusive ownership of the cell
    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut T {
        self.0.get_mut()
    }
}
