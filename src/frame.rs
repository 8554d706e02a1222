//! A single activation record on a thread's frame stack (JVMS §2.6).
//!
//! Grounded in `original_source/runtime/frame.h`. `caller_pc` is this crate's own addition (not
//! present in the original, which never restores `pc` after a return at all): a frame sets
//! `caller_pc` on *itself*, right before it pushes a callee, to record where it should resume;
//! on return the newly-exposed top frame's own `caller_pc` is read to restore the thread's `pc`.
//! `Frame` deliberately derives neither `Clone` nor `Copy` — it is move-only, so the frame stack
//! has a single owner for each activation at all times.

use crate::local_variables::LocalVariables;
use crate::method::Method;
use crate::operand_stack::OperandStack;

pub struct Frame {
    pub method: *const Method,
    pub locals: LocalVariables,
    pub operand_stack: OperandStack,
    pub caller_pc: usize,
}

impl Frame {
    pub fn new(method: *const Method) -> Self {
        let m = unsafe { &*method };
        Frame {
            method,
            locals: LocalVariables::new(m.max_locals as usize),
            operand_stack: OperandStack::new(m.max_stack as usize),
            caller_pc: 0,
        }
    }

    pub fn method(&self) -> &Method {
        unsafe { &*self.method }
    }
}
