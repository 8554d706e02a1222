//! A single thread of bytecode execution: one frame stack, one program counter.
//!
//! Grounded in `original_source/runtime/thread.h`'s `Thread`. Per §5's concurrency model this
//! crate only ever drives one `Thread` at a time through `Interpreter::interpret`; nothing here
//! is synchronized.

use crate::error::{VmError, VmResult};
use crate::frame::Frame;

pub struct Thread {
    frames: Vec<Frame>,
    pc: usize,
}

impl Thread {
    pub fn new() -> Self {
        Thread { frames: Vec::new(), pc: 0 }
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> VmResult<Frame> {
        self.frames.pop().ok_or_else(|| VmError::OutOfBounds("pop_frame on empty frame stack".to_string()))
    }

    pub fn current_frame(&self) -> VmResult<&Frame> {
        self.frames.last().ok_or_else(|| VmError::OutOfBounds("current_frame on empty frame stack".to_string()))
    }

    pub fn current_frame_mut(&mut self) -> VmResult<&mut Frame> {
        self.frames.last_mut().ok_or_else(|| VmError::OutOfBounds("current_frame on empty frame stack".to_string()))
    }

    pub fn is_stack_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub fn increment_pc(&mut self, by: usize) {
        self.pc += by;
    }
}

impl Default for Thread {
    fn default() -> Self {
        Thread::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn dummy_method() -> Method {
        Method {
            owner: std::ptr::null_mut(),
            name: "m".to_string(),
            descriptor: "()V".to_string(),
            access_flags: 0,
            max_stack: 1,
            max_locals: 1,
            code: vec![0xB1],
        }
    }

    #[test]
    fn pc_tracks_set_and_increment() {
        let mut thread = Thread::new();
        thread.set_pc(10);
        thread.increment_pc(3);
        assert_eq!(thread.pc(), 13);
    }

    #[test]
    fn pushing_and_popping_frames_tracks_stack_emptiness() {
        let method = dummy_method();
        let mut thread = Thread::new();
        assert!(thread.is_stack_empty());
        thread.push_frame(Frame::new(&method as *const Method));
        assert!(!thread.is_stack_empty());
        assert_eq!(thread.frame_count(), 1);
        thread.pop_frame().unwrap();
        assert!(thread.is_stack_empty());
    }

    #[test]
    fn pop_frame_on_empty_stack_is_an_error() {
        let mut thread = Thread::new();
        assert!(thread.pop_frame().is_err());
    }
}
