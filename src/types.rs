//! Wire-format and runtime-value type aliases shared across the crate.

/// Unsigned big-endian wire widths, named after the JVM spec's own `u1`/`u2`/`u4` notation.
pub type U1 = u8;
pub type U2 = u16;
pub type U4 = u32;
pub type U8 = u64;

/// Java's own primitive types, as they appear in the interpreter and runtime constant pool.
pub type Jbyte = i8;
pub type Jshort = i16;
pub type Jint = i32;
pub type Jlong = i64;
/// Java `char` is 16-bit UTF-16, hence unsigned.
pub type Jchar = u16;
pub type Jfloat = f32;
pub type Jdouble = f64;
pub type Jboolean = u8;

/// A reference is opaque here: the heap is out of scope, so references only ever take the
/// value `0` (null). Kept as a distinct type rather than `()` so `ACONST_NULL`/`IFNULL`/`ARETURN`
/// read naturally and a future heap could slot in behind this alias without touching callers.
pub type Jref = u64;

pub const JREF_NULL: Jref = 0;

/// A single local-variable or operand-stack storage cell, wide enough to hold any one of
/// `Jint/Jfloat/Jlong/Jdouble/Jref` by reinterpreting the same 8 bytes. Long and double values
/// occupy two adjacent `Slot`s; see `LocalVariables` and `OperandStack` for exactly how.
///
/// The reference implementation models this as a tagless C union. Rust has no safe tagless
/// union, so `Slot` stores the raw bits and each typed accessor reinterprets them explicitly.
/// This mirrors the union's "no runtime tag, caller must know the type" contract precisely:
/// reading a slot as the wrong type is a logic bug here exactly as it would be there.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Slot {
    bits: u64,
}

impl Slot {
    pub fn from_int(value: Jint) -> Self {
        Slot { bits: value as u32 as u64 }
    }

    pub fn as_int(self) -> Jint {
        self.bits as u32 as Jint
    }

    pub fn from_float(value: Jfloat) -> Self {
        Slot { bits: value.to_bits() as u64 }
    }

    pub fn as_float(self) -> Jfloat {
        Jfloat::from_bits(self.bits as u32)
    }

    pub fn from_long(value: Jlong) -> Self {
        Slot { bits: value as u64 }
    }

    pub fn as_long(self) -> Jlong {
        self.bits as Jlong
    }

    pub fn from_double(value: Jdouble) -> Self {
        Slot { bits: value.to_bits() }
    }

    pub fn as_double(self) -> Jdouble {
        Jdouble::from_bits(self.bits)
    }

    pub fn from_ref(value: Jref) -> Self {
        Slot { bits: value }
    }

    pub fn as_ref(self) -> Jref {
        self.bits
    }
}
