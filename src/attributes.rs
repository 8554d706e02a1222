//! Class-file attribute structures (JVMS §4.7).
//!
//! Grounded in `jvm.rs`'s `AttributeInfo`/`parse_attribute_info`, extended so an attribute the
//! parser doesn't specifically model (`Generic`) retains its raw bytes instead of being silently
//! skipped.

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethod {
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeInfo {
    ConstantValue { constant_value_index: u16 },
    Code {
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
        exception_table: Vec<ExceptionTableEntry>,
        attributes: AttributeTable,
    },
    Exceptions { index_table: Vec<u16> },
    BootstrapMethods { methods: Vec<BootstrapMethod> },
    StackMapTable { raw: Vec<u8> },
    SourceFile { sourcefile_index: u16 },
    NestHost { host_class_index: u16 },
    NestMembers { classes: Vec<u16> },
    /// Any attribute this parser does not specifically model. The name has already been
    /// resolved from the constant pool; the body is kept verbatim so round-tripping a class
    /// file never silently drops data.
    Generic { name: String, info: Vec<u8> },
}

/// An ordered attribute list, exactly as it appeared on the class file (fields, methods, the
/// class itself, and `Code` attributes all carry one of these).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTable {
    attributes: Vec<AttributeInfo>,
}

impl AttributeTable {
    pub fn new(attributes: Vec<AttributeInfo>) -> Self {
        AttributeTable { attributes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The first `Code` attribute, if any. A method carries at most one per JVMS.
    pub fn code(&self) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| matches!(a, AttributeInfo::Code { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_code_attribute_among_others() {
        let table = AttributeTable::new(vec![
            AttributeInfo::SourceFile { sourcefile_index: 7 },
            AttributeInfo::Code {
                max_stack: 2,
                max_locals: 1,
                code: vec![0x00],
                exception_table: vec![],
                attributes: AttributeTable::default(),
            },
        ]);
        assert!(matches!(table.code(), Some(AttributeInfo::Code { .. })));
    }

    #[test]
    fn unrecognized_attribute_keeps_raw_bytes() {
        let attr = AttributeInfo::Generic { name: "Signature".to_string(), info: vec![0, 1] };
        match attr {
            AttributeInfo::Generic { name, info } => {
                assert_eq!(name, "Signature");
                assert_eq!(info, vec![0, 1]);
            }
            _ => panic!("expected Generic"),
        }
    }
}
