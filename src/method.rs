//! A linked method, as it hangs off a `Klass`.
//!
//! Grounded in `original_source/runtime/method.h`'s `Method*` role: a method belongs to exactly
//! one `Klass` and carries its own code buffer plus the `max_stack`/`max_locals` a `Frame` needs
//! to size its operand stack and local variable array. The `owner` pointer is set to null at
//! construction and fixed up to point at the owning `Klass`'s stable address once that `Klass`
//! has been boxed by the method area — see `klass::build`.

use crate::members::{ACC_ABSTRACT, ACC_NATIVE, ACC_STATIC};

use crate::klass::Klass;

pub struct Method {
    pub owner: *mut Klass,
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

impl Method {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_native(&self) -> bool {
        self.access_flags & ACC_NATIVE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    /// A method-shaped placeholder used only by the test harness's sentinel frame: its `code`
    /// is a buffer of `code_len` `NOP`s so `pc >= code.len()` fires exactly when a real callee
    /// invoked from it returns.
    pub fn sentinel(code_len: usize) -> Method {
        Method {
            owner: std::ptr::null_mut(),
            name: "<sentinel>".to_string(),
            descriptor: "()V".to_string(),
            access_flags: ACC_STATIC,
            max_stack: 0,
            max_locals: 0,
            code: vec![0u8; code_len],
        }
    }
}
