//! x86_64 System V port
//!
//! A saved context is the stack pointer of a frame holding the callee-saved
//! registers, MXCSR and the x87 control word:
//!
//! ```text
//!   sp + 0   mxcsr (u32), fpu control word (u16)
//!   sp + 8   r15
//!   sp + 16  r14
//!   sp + 24  r13
//!   sp + 32  r12
//!   sp + 40  rbx
//!   sp + 48  rbp
//!   sp + 56  return address
//! ```

use core::arch::naked_asm;

use super::ContextEntry;

/// Default MXCSR (all exceptions masked) in the low half, default x87
/// control word in bits 32..48
const FP_CONTROL_INIT: usize = 0x0000_037F_0000_1F80;

/// Words in the initial frame, including one pad word above the return
/// address so the entry trampoline starts with call alignment
const INIT_FRAME_WORDS: usize = 9;

/// Build the first frame of a new context below `stack_top`
///
/// # Safety
/// `stack_top` must be the end of a writable region larger than the frame.
pub(super) unsafe fn init_frame(stack_top: *mut u8, entry: ContextEntry, arg: usize) -> usize {
    let top = (stack_top as usize) & !15;
    let frame = (top - INIT_FRAME_WORDS * 8) as *mut usize;

    let words: [usize; INIT_FRAME_WORDS] = [
        FP_CONTROL_INIT,
        0,                                    // r15
        0,                                    // r14
        0,                                    // r13
        entry as usize,                       // r12
        arg,                                  // rbx
        0,                                    // rbp
        context_entry as *const () as usize,  // return address
        0,
    ];

    unsafe { frame.copy_from_nonoverlapping(words.as_ptr(), INIT_FRAME_WORDS) };

    frame as usize
}

/// Save callee-saved state to the current stack, store the stack pointer in
/// `*from_sp`, then load `to_sp` and restore the state found there
#[unsafe(naked)]
pub(super) unsafe extern "C" fn swap_context(from_sp: *mut usize, to_sp: usize) {
    naked_asm!(
        "push rbp",
        "push rbx",
        "push r12",
        "push r13",
        "push r14",
        "push r15",
        "sub rsp, 8",
        "stmxcsr dword ptr [rsp]",
        "fnstcw word ptr [rsp + 4]",
        "mov qword ptr [rdi], rsp",
        "mov rsp, rsi",
        "ldmxcsr dword ptr [rsp]",
        "fldcw word ptr [rsp + 4]",
        "add rsp, 8",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop rbx",
        "pop rbp",
        "ret",
    );
}

/// First code run on a new context: call `entry(arg)` from r12/rbx
#[unsafe(naked)]
unsafe extern "C" fn context_entry() -> ! {
    naked_asm!(
        "mov rdi, rbx",
        "and rsp, -16",
        "call r12",
        "ud2",
    );
}
