//! The class file's own (static) constant pool: a 1-indexed table of tagged entries.
//!
//! Grounded in `jvm.rs`'s `CPInfo`/`ConstantKind`, with the per-tag field layout and
//! bounds-checked accessors following `original_source/runtime/constant_pool.h`'s sibling,
//! `class_loader/constant_pool.h`.

use crate::error::{VmError, VmResult};

/// One constant pool slot. Index 0 is never used; the slot that follows a `Long`/`Double` entry
/// is reserved and carries no meaningful content (JVMS §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    Empty,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
}

/// Wraps the flat `CpInfo` vector and offers the handful of typed lookups every later layer
/// needs: a raw entry, a decoded `Utf8`, a class's binary name, or a `NameAndType` pair.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub fn new(entries: Vec<CpInfo>) -> Self {
        ConstantPool { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: u16) -> VmResult<&CpInfo> {
        self.entries
            .get(index as usize)
            .ok_or_else(|| VmError::OutOfBounds(format!("constant pool index {index} out of range")))
    }

    pub fn utf8(&self, index: u16) -> VmResult<&str> {
        match self.entry(index)? {
            CpInfo::Utf8(s) => Ok(s.as_str()),
            other => Err(VmError::MalformedClass(format!(
                "expected Utf8 at constant pool index {index}, found {other:?}"
            ))),
        }
    }

    pub fn class_name(&self, index: u16) -> VmResult<&str> {
        match self.entry(index)? {
            CpInfo::Class { name_index } => self.utf8(*name_index),
            other => Err(VmError::MalformedClass(format!(
                "expected Class at constant pool index {index}, found {other:?}"
            ))),
        }
    }

    pub fn name_and_type(&self, index: u16) -> VmResult<(&str, &str)> {
        match self.entry(index)? {
            CpInfo::NameAndType { name_index, descriptor_index } => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            other => Err(VmError::MalformedClass(format!(
                "expected NameAndType at constant pool index {index}, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> ConstantPool {
        ConstantPool::new(vec![
            CpInfo::Empty,
            CpInfo::Utf8("java/lang/Object".to_string()),
            CpInfo::Class { name_index: 1 },
            CpInfo::Utf8("foo".to_string()),
            CpInfo::Utf8("()V".to_string()),
            CpInfo::NameAndType { name_index: 3, descriptor_index: 4 },
        ])
    }

    #[test]
    fn resolves_class_name_through_utf8() {
        let cp = sample_pool();
        assert_eq!(cp.class_name(2).unwrap(), "java/lang/Object");
    }

    #[test]
    fn resolves_name_and_type_pair() {
        let cp = sample_pool();
        assert_eq!(cp.name_and_type(5).unwrap(), ("foo", "()V"));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let cp = sample_pool();
        assert!(cp.entry(99).is_err());
    }

    #[test]
    fn wrong_tag_is_malformed_class() {
        let cp = sample_pool();
        assert!(cp.class_name(3).is_err());
    }
}
