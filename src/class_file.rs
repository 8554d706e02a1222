//! The immutable, fully-parsed representation of a single `.class` file (JVMS §4.1).
//!
//! Grounded in `jvm.rs`'s `JVMClassFile`; the magic constant matches
//! `original_source/class_loader/class_file.h`.

use crate::attributes::AttributeTable;
use crate::constant_pool::ConstantPool;
use crate::members::{FieldInfo, MethodInfo};
use crate::version::Version;

pub const CLASS_FILE_MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub magic: u32,
    pub version: Version,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class_index: u16,
    pub super_class_index: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: AttributeTable,
}

impl ClassFile {
    pub fn this_class_name(&self) -> crate::error::VmResult<&str> {
        self.constant_pool.class_name(self.this_class_index)
    }
}
