//! AArch64 port
//!
//! A saved context is the stack pointer of a 160-byte frame holding
//! x19-x28, the frame pointer, the link register and d8-d15. `ret` in
//! [`swap_context`] resumes at the restored link register.

use core::arch::naked_asm;

use super::ContextEntry;

/// Frame size in words (x19-x30 then d8-d15)
const FRAME_WORDS: usize = 20;

/// Build the first frame of a new context below `stack_top`
///
/// # Safety
/// `stack_top` must be the end of a writable region larger than the frame.
pub(super) unsafe fn init_frame(stack_top: *mut u8, entry: ContextEntry, arg: usize) -> usize {
    let top = (stack_top as usize) & !15;
    let frame = (top - FRAME_WORDS * 8) as *mut usize;

    let mut words = [0usize; FRAME_WORDS];
    words[0] = arg; // x19
    words[1] = entry as usize; // x20
    words[11] = context_entry as *const () as usize; // x30, x29 stays zero

    unsafe { frame.copy_from_nonoverlapping(words.as_ptr(), FRAME_WORDS) };

    frame as usize
}

/// Save callee-saved state to the current stack, store the stack pointer in
/// `*from_sp`, then load `to_sp` and restore the state found there
#[unsafe(naked)]
pub(super) unsafe extern "C" fn swap_context(from_sp: *mut usize, to_sp: usize) {
    naked_asm!(
        "sub sp, sp, #160",
        "stp x19, x20, [sp, #0]",
        "stp x21, x22, [sp, #16]",
        "stp x23, x24, [sp, #32]",
        "stp x25, x26, [sp, #48]",
        "stp x27, x28, [sp, #64]",
        "stp x29, x30, [sp, #80]",
        "stp d8, d9, [sp, #96]",
        "stp d10, d11, [sp, #112]",
        "stp d12, d13, [sp, #128]",
        "stp d14, d15, [sp, #144]",
        "mov x9, sp",
        "str x9, [x0]",
        "mov sp, x1",
        "ldp x19, x20, [sp, #0]",
        "ldp x21, x22, [sp, #16]",
        "ldp x23, x24, [sp, #32]",
        "ldp x25, x26, [sp, #48]",
        "ldp x27, x28, [sp, #64]",
        "ldp x29, x30, [sp, #80]",
        "ldp d8, d9, [sp, #96]",
        "ldp d10, d11, [sp, #112]",
        "ldp d12, d13, [sp, #128]",
        "ldp d14, d15, [sp, #144]",
        "add sp, sp, #160",
        "ret",
    );
}

/// First code run on a new context: call `entry(arg)` from x20/x19
#[unsafe(naked)]
unsafe extern "C" fn context_entry() -> ! {
    naked_asm!(
        "mov x0, x19",
        "blr x20",
        "brk #0",
    );
}
