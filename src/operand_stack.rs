//! A frame's operand stack (JVMS §2.6.2): a LIFO of `Slot`s sized up front to the owning method's
//! `max_stack`.
//!
//! Grounded in `original_source/runtime/operand_stack.h`. Typed push/pop assume the caller
//! already knows the value's type (there is no verifier here to check); long/double values push
//! a placeholder slot first and the value second, so the value sits on top and a plain
//! `pop_slot` discards it before the matching placeholder pop — this is exactly the convention
//! `POP2`/the `DUP2*` family assume.

use crate::error::{VmError, VmResult};
use crate::types::{Jdouble, Jfloat, Jint, Jlong, Jref, Slot};

pub struct OperandStack {
    slots: Vec<Slot>,
}

impl OperandStack {
    pub fn new(max_stack: usize) -> Self {
        OperandStack { slots: Vec::with_capacity(max_stack) }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push_slot(&mut self, value: Slot) {
        self.slots.push(value);
    }

    pub fn pop_slot(&mut self) -> VmResult<Slot> {
        self.slots.pop().ok_or_else(|| VmError::OutOfBounds("pop from empty operand stack".to_string()))
    }

    pub fn peek_slot(&self) -> VmResult<Slot> {
        self.slots.last().copied().ok_or_else(|| VmError::OutOfBounds("peek on empty operand stack".to_string()))
    }

    pub fn push_int(&mut self, value: Jint) {
        self.push_slot(Slot::from_int(value));
    }

    pub fn pop_int(&mut self) -> VmResult<Jint> {
        Ok(self.pop_slot()?.as_int())
    }

    pub fn push_float(&mut self, value: Jfloat) {
        self.push_slot(Slot::from_float(value));
    }

    pub fn pop_float(&mut self) -> VmResult<Jfloat> {
        Ok(self.pop_slot()?.as_float())
    }

    pub fn push_ref(&mut self, value: Jref) {
        self.push_slot(Slot::from_ref(value));
    }

    pub fn pop_ref(&mut self) -> VmResult<Jref> {
        Ok(self.pop_slot()?.as_ref())
    }

    /// Pushes a placeholder slot, then the value, so the value sits on top.
    pub fn push_long(&mut self, value: Jlong) {
        self.push_slot(Slot::default());
        self.push_slot(Slot::from_long(value));
    }

    /// Pops the value slot, then discards the placeholder beneath it.
    pub fn pop_long(&mut self) -> VmResult<Jlong> {
        let value = self.pop_slot()?.as_long();
        self.pop_slot()?;
        Ok(value)
    }

    pub fn push_double(&mut self, value: Jdouble) {
        self.push_slot(Slot::default());
        self.push_slot(Slot::from_double(value));
    }

    pub fn pop_double(&mut self) -> VmResult<Jdouble> {
        let value = self.pop_slot()?.as_double();
        self.pop_slot()?;
        Ok(value)
    }

    pub fn pop(&mut self) -> VmResult<()> {
        self.pop_slot()?;
        Ok(())
    }

    pub fn pop2(&mut self) -> VmResult<()> {
        self.pop_slot()?;
        self.pop_slot()?;
        Ok(())
    }

    pub fn dup(&mut self) -> VmResult<()> {
        let top = self.peek_slot()?;
        self.push_slot(top);
        Ok(())
    }

    pub fn dup_x1(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        self.push_slot(a);
        self.push_slot(b);
        self.push_slot(a);
        Ok(())
    }

    pub fn dup_x2(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        let c = self.pop_slot()?;
        self.push_slot(a);
        self.push_slot(c);
        self.push_slot(b);
        self.push_slot(a);
        Ok(())
    }

    pub fn dup2(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        self.push_slot(b);
        self.push_slot(a);
        self.push_slot(b);
        self.push_slot(a);
        Ok(())
    }

    pub fn dup2_x1(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        let c = self.pop_slot()?;
        self.push_slot(b);
        self.push_slot(a);
        self.push_slot(c);
        self.push_slot(b);
        self.push_slot(a);
        Ok(())
    }

    pub fn dup2_x2(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        let c = self.pop_slot()?;
        let d = self.pop_slot()?;
        self.push_slot(b);
        self.push_slot(a);
        self.push_slot(d);
        self.push_slot(c);
        self.push_slot(b);
        self.push_slot(a);
        Ok(())
    }

    pub fn swap(&mut self) -> VmResult<()> {
        let a = self.pop_slot()?;
        let b = self.pop_slot()?;
        self.push_slot(a);
        self.push_slot(b);
        Ok(())
    }
}
