//! The crate's single error taxonomy. Every fallible operation in every layer returns
//! `Result<T, VmError>`; there is no wrapping or layering on top of this.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("invalid class file magic")]
    InvalidMagic,

    #[error("invalid constant pool tag: {0}")]
    InvalidTag(u8),

    #[error("malformed class file: {0}")]
    MalformedClass(String),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("method not found: {class}.{name}{descriptor}")]
    MethodNotFound { class: String, name: String, descriptor: String },

    #[error("field not found: {class}.{name}:{descriptor}")]
    FieldNotFound { class: String, name: String, descriptor: String },

    #[error("incompatible method call: {0}")]
    IncompatibleMethodCall(String),

    #[error("/ by zero")]
    ArithmeticDivByZero,

    #[error("invalid opcode: {0}")]
    InvalidOpcode(u8),

    #[error("unimplemented opcode: {0}")]
    Unimplemented(&'static str),
}

pub type VmResult<T> = Result<T, VmError>;
