//! A frame's local variable array (JVMS §2.6.1): a dense, index-checked vector of `Slot`s sized
//! to the owning method's `max_locals`.
//!
//! Grounded in `original_source/runtime/local_variables.h`. Long/double values occupy two
//! adjacent slots at `(i, i+1)`; reading slot `i+1` directly afterward observes whatever
//! `from_long`/`from_double` happened to leave there (the reference does not zero it), so callers
//! must always address a wide value through its low slot.

use crate::error::{VmError, VmResult};
use crate::types::{Jdouble, Jfloat, Jint, Jlong, Jref, Slot};

pub struct LocalVariables {
    slots: Vec<Slot>,
}

impl LocalVariables {
    pub fn new(max_locals: usize) -> Self {
        LocalVariables { slots: vec![Slot::default(); max_locals] }
    }

    fn check(&self, index: usize) -> VmResult<()> {
        if index >= self.slots.len() {
            return Err(VmError::OutOfBounds(format!("local variable index {index} out of range")));
        }
        Ok(())
    }

    pub fn get_slot(&self, index: usize) -> VmResult<Slot> {
        self.check(index)?;
        Ok(self.slots[index])
    }

    pub fn set_slot(&mut self, index: usize, value: Slot) -> VmResult<()> {
        self.check(index)?;
        self.slots[index] = value;
        Ok(())
    }

    pub fn get_int(&self, index: usize) -> VmResult<Jint> {
        Ok(self.get_slot(index)?.as_int())
    }

    pub fn set_int(&mut self, index: usize, value: Jint) -> VmResult<()> {
        self.set_slot(index, Slot::from_int(value))
    }

    pub fn get_float(&self, index: usize) -> VmResult<Jfloat> {
        Ok(self.get_slot(index)?.as_float())
    }

    pub fn set_float(&mut self, index: usize, value: Jfloat) -> VmResult<()> {
        self.set_slot(index, Slot::from_float(value))
    }

    pub fn get_ref(&self, index: usize) -> VmResult<Jref> {
        Ok(self.get_slot(index)?.as_ref())
    }

    pub fn set_ref(&mut self, index: usize, value: Jref) -> VmResult<()> {
        self.set_slot(index, Slot::from_ref(value))
    }

    /// Reads a long/double occupying `(index, index+1)` back out of its low slot.
    pub fn get_long(&self, index: usize) -> VmResult<Jlong> {
        Ok(self.get_slot(index)?.as_long())
    }

    pub fn set_long(&mut self, index: usize, value: Jlong) -> VmResult<()> {
        self.check(index + 1)?;
        self.slots[index] = Slot::from_long(value);
        Ok(())
    }

    pub fn get_double(&self, index: usize) -> VmResult<Jdouble> {
        Ok(self.get_slot(index)?.as_double())
    }

    pub fn set_double(&mut self, index: usize, value: Jdouble) -> VmResult<()> {
        self.check(index + 1)?;
        self.slots[index] = Slot::from_double(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips() {
        let mut locals = LocalVariables::new(4);
        locals.set_int(2, -7).unwrap();
        assert_eq!(locals.get_int(2).unwrap(), -7);
    }

    #[test]
    fn long_occupies_its_index_and_checks_the_next_one_is_in_range() {
        let mut locals = LocalVariables::new(2);
        locals.set_long(0, i64::MAX).unwrap();
        assert_eq!(locals.get_long(0).unwrap(), i64::MAX);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let locals = LocalVariables::new(1);
        assert!(locals.get_int(5).is_err());
    }
}
