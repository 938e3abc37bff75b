//! Task stacks
//!
//! Each task except the bootstrap task runs on a fixed-size block taken from
//! the global allocator. The block belongs to the task until the dispatcher
//! reclaims it after the task has terminated.

use alloc::alloc::{alloc, dealloc, Layout};
use core::ptr::NonNull;

use crate::config::{CFG_STACK_ALIGN, CFG_STACK_SIZE_MIN};
use crate::error::{OsError, OsResult};

/// Owned task stack
#[derive(Debug)]
pub struct Stack {
    base: NonNull<u8>,
    layout: Layout,
}

impl Stack {
    /// Allocate a stack of `size` bytes
    ///
    /// # Returns
    /// * `Err(OsError::StkSizeInvalid)` - `size` is below `CFG_STACK_SIZE_MIN`
    /// * `Err(OsError::StkAlloc)` - the allocator is out of memory
    pub fn new(size: usize) -> OsResult<Self> {
        if size < CFG_STACK_SIZE_MIN {
            return Err(OsError::StkSizeInvalid);
        }

        let layout =
            Layout::from_size_align(size, CFG_STACK_ALIGN).map_err(|_| OsError::StkSizeInvalid)?;

        // SAFETY: layout has a non-zero size
        let base = unsafe { alloc(layout) };

        NonNull::new(base)
            .map(|base| Stack { base, layout })
            .ok_or(OsError::StkAlloc)
    }

    /// Lowest address of the block
    #[inline]
    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// One past the highest address; stacks grow down from here
    #[inline]
    pub fn top(&self) -> *mut u8 {
        // SAFETY: one past the end of the allocation
        unsafe { self.base.as_ptr().add(self.layout.size()) }
    }

    /// Size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this layout
        unsafe { dealloc(self.base.as_ptr(), self.layout) }
    }
}
