//! Binary parser for a Java SE 8 `.class` file (JVMS §4).
//!
//! Grounded in `jvm.rs`'s `JVMParser::parse` and its attribute-specific helpers,
//! restructured so every failure mode returns `VmError` instead of panicking, and so that
//! interfaces are parsed before fields/methods (the historically correct ordering).

use crate::attributes::{AttributeInfo, AttributeTable, BootstrapMethod, ExceptionTableEntry};
use crate::bytereader::ByteReader;
use crate::class_file::{ClassFile, CLASS_FILE_MAGIC};
use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{VmError, VmResult};
use crate::members::{FieldInfo, MethodInfo};
use crate::version::Version;

pub struct ClassFileParser;

impl ClassFileParser {
    pub fn parse(bytes: &[u8]) -> VmResult<ClassFile> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.read_u4()?;
        if magic != CLASS_FILE_MAGIC {
            return Err(VmError::InvalidMagic);
        }

        let minor = reader.read_u2()?;
        let major = reader.read_u2()?;
        let version = Version::new(major, minor);

        let constant_pool_count = reader.read_u2()?;
        let constant_pool = Self::parse_constant_pool(&mut reader, constant_pool_count)?;

        let access_flags = reader.read_u2()?;
        let this_class_index = reader.read_u2()?;
        let super_class_index = reader.read_u2()?;

        let interfaces_count = reader.read_u2()?;
        let interfaces = Self::parse_interfaces(&mut reader, interfaces_count)?;

        let fields_count = reader.read_u2()?;
        let fields = Self::parse_members(&mut reader, fields_count, &constant_pool)?
            .into_iter()
            .map(|(access_flags, name_index, descriptor_index, name, descriptor, attributes)| FieldInfo {
                access_flags,
                name_index,
                descriptor_index,
                name,
                descriptor,
                attributes,
            })
            .collect();

        let methods_count = reader.read_u2()?;
        let methods = Self::parse_members(&mut reader, methods_count, &constant_pool)?
            .into_iter()
            .map(|(access_flags, name_index, descriptor_index, name, descriptor, attributes)| MethodInfo {
                access_flags,
                name_index,
                descriptor_index,
                name,
                descriptor,
                attributes,
            })
            .collect();

        let attributes_count = reader.read_u2()?;
        let attributes = Self::parse_attribute_table(&mut reader, attributes_count, &constant_pool)?;

        Ok(ClassFile {
            magic,
            version,
            constant_pool,
            access_flags,
            this_class_index,
            super_class_index,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_constant_pool(reader: &mut ByteReader, constant_pool_count: u16) -> VmResult<ConstantPool> {
        let mut entries = vec![CpInfo::Empty; constant_pool_count as usize];
        let mut i: u16 = 1;
        while i < constant_pool_count {
            let tag = reader.read_u1()?;
            let info = Self::parse_cp_info(reader, tag)?;
            let is_wide = matches!(info, CpInfo::Long(_) | CpInfo::Double(_));
            entries[i as usize] = info;
            i += if is_wide { 2 } else { 1 };
        }
        Ok(ConstantPool::new(entries))
    }

    fn parse_cp_info(reader: &mut ByteReader, tag: u8) -> VmResult<CpInfo> {
        match tag {
            1 => {
                let length = reader.read_u2()?;
                let bytes = reader.read_bytes(length as usize)?;
                let s = String::from_utf8(bytes)
                    .map_err(|e| VmError::MalformedClass(format!("invalid utf8 constant: {e}")))?;
                Ok(CpInfo::Utf8(s))
            }
            3 => Ok(CpInfo::Integer(reader.read_u4()? as i32)),
            4 => Ok(CpInfo::Float(f32::from_bits(reader.read_u4()?))),
            5 => {
                let hi = reader.read_u4()? as u64;
                let lo = reader.read_u4()? as u64;
                Ok(CpInfo::Long((((hi << 32) | lo) as i64) as i64))
            }
            6 => {
                let hi = reader.read_u4()? as u64;
                let lo = reader.read_u4()? as u64;
                Ok(CpInfo::Double(f64::from_bits((hi << 32) | lo)))
            }
            7 => Ok(CpInfo::Class { name_index: reader.read_u2()? }),
            8 => Ok(CpInfo::String { string_index: reader.read_u2()? }),
            9 => Ok(CpInfo::Fieldref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            10 => Ok(CpInfo::Methodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            11 => Ok(CpInfo::InterfaceMethodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            12 => Ok(CpInfo::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            }),
            15 => Ok(CpInfo::MethodHandle {
                reference_kind: reader.read_u1()?,
                reference_index: reader.read_u2()?,
            }),
            16 => Ok(CpInfo::MethodType { descriptor_index: reader.read_u2()? }),
            18 => Ok(CpInfo::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            }),
            other => Err(VmError::InvalidTag(other)),
        }
    }

    fn parse_interfaces(reader: &mut ByteReader, count: u16) -> VmResult<Vec<u16>> {
        let mut interfaces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            interfaces.push(reader.read_u2()?);
        }
        Ok(interfaces)
    }

    /// Shared shape between `field_info` and `method_info` (JVMS §4.5/§4.6): both are
    /// `(access_flags, name_index, descriptor_index, attributes)`.
    #[allow(clippy::type_complexity)]
    fn parse_members(
        reader: &mut ByteReader,
        count: u16,
        cp: &ConstantPool,
    ) -> VmResult<Vec<(u16, u16, u16, String, String, AttributeTable)>> {
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let access_flags = reader.read_u2()?;
            let name_index = reader.read_u2()?;
            let descriptor_index = reader.read_u2()?;
            let name = cp.utf8(name_index)?.to_string();
            let descriptor = cp.utf8(descriptor_index)?.to_string();
            let attributes_count = reader.read_u2()?;
            let attributes = Self::parse_attribute_table(reader, attributes_count, cp)?;
            members.push((access_flags, name_index, descriptor_index, name, descriptor, attributes));
        }
        Ok(members)
    }

    fn parse_attribute_table(reader: &mut ByteReader, count: u16, cp: &ConstantPool) -> VmResult<AttributeTable> {
        let mut attributes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            attributes.push(Self::parse_attribute(reader, cp)?);
        }
        Ok(AttributeTable::new(attributes))
    }

    fn parse_attribute(reader: &mut ByteReader, cp: &ConstantPool) -> VmResult<AttributeInfo> {
        let name_index = reader.read_u2()?;
        let name = cp.utf8(name_index)?.to_string();
        let attribute_length = reader.read_u4()?;

        match name.as_str() {
            "ConstantValue" => Ok(AttributeInfo::ConstantValue { constant_value_index: reader.read_u2()? }),
            "Code" => Self::parse_code_attribute(reader, cp),
            "Exceptions" => {
                let count = reader.read_u2()?;
                let mut index_table = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    index_table.push(reader.read_u2()?);
                }
                Ok(AttributeInfo::Exceptions { index_table })
            }
            "BootstrapMethods" => {
                let count = reader.read_u2()?;
                let mut methods = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let method_ref = reader.read_u2()?;
                    let arg_count = reader.read_u2()?;
                    let mut arguments = Vec::with_capacity(arg_count as usize);
                    for _ in 0..arg_count {
                        arguments.push(reader.read_u2()?);
                    }
                    methods.push(BootstrapMethod { method_ref, arguments });
                }
                Ok(AttributeInfo::BootstrapMethods { methods })
            }
            "StackMapTable" => Ok(AttributeInfo::StackMapTable { raw: reader.read_bytes(attribute_length as usize)? }),
            "SourceFile" => Ok(AttributeInfo::SourceFile { sourcefile_index: reader.read_u2()? }),
            "NestHost" => Ok(AttributeInfo::NestHost { host_class_index: reader.read_u2()? }),
            "NestMembers" => {
                let count = reader.read_u2()?;
                let mut classes = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    classes.push(reader.read_u2()?);
                }
                Ok(AttributeInfo::NestMembers { classes })
            }
            _ => Ok(AttributeInfo::Generic { name, info: reader.read_bytes(attribute_length as usize)? }),
        }
    }

    fn parse_code_attribute(reader: &mut ByteReader, cp: &ConstantPool) -> VmResult<AttributeInfo> {
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()?;
        let code = reader.read_bytes(code_length as usize)?;

        let exception_table_length = reader.read_u2()?;
        let mut exception_table = Vec::with_capacity(exception_table_length as usize);
        for _ in 0..exception_table_length {
            exception_table.push(ExceptionTableEntry {
                start_pc: reader.read_u2()?,
                end_pc: reader.read_u2()?,
                handler_pc: reader.read_u2()?,
                catch_type: reader.read_u2()?,
            });
        }

        let attributes_count = reader.read_u2()?;
        let attributes = Self::parse_attribute_table(reader, attributes_count, cp)?;

        Ok(AttributeInfo::Code { max_stack, max_locals, code, exception_table, attributes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembles the smallest legal class file: `java/lang/Object`-less, no fields, one
    /// static no-op method `f()V` whose body is a single `RETURN`.
    fn minimal_class_bytes() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&CLASS_FILE_MAGIC.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes()); // minor
        b.extend_from_slice(&52u16.to_be_bytes()); // major

        // constant pool: #1 Utf8 "Test", #2 Class -> #1, #3 Utf8 "f", #4 Utf8 "()V", #5 Utf8 "Code"
        b.extend_from_slice(&6u16.to_be_bytes()); // constant_pool_count = count+1
        push_utf8(&mut b, "Test");
        b.push(7);
        b.extend_from_slice(&1u16.to_be_bytes());
        push_utf8(&mut b, "f");
        push_utf8(&mut b, "()V");
        push_utf8(&mut b, "Code");

        b.extend_from_slice(&0x0021u16.to_be_bytes()); // access_flags: PUBLIC|SUPER
        b.extend_from_slice(&2u16.to_be_bytes()); // this_class
        b.extend_from_slice(&0u16.to_be_bytes()); // super_class
        b.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count
        b.extend_from_slice(&0u16.to_be_bytes()); // fields_count

        b.extend_from_slice(&1u16.to_be_bytes()); // methods_count
        b.extend_from_slice(&0x0009u16.to_be_bytes()); // access_flags: PUBLIC|STATIC
        b.extend_from_slice(&3u16.to_be_bytes()); // name_index -> "f"
        b.extend_from_slice(&4u16.to_be_bytes()); // descriptor_index -> "()V"
        b.extend_from_slice(&1u16.to_be_bytes()); // attributes_count
        b.extend_from_slice(&5u16.to_be_bytes()); // attribute_name_index -> "Code"
        let code = vec![0xB1u8]; // RETURN
        let code_attr_len: u32 = 2 + 2 + 4 + code.len() as u32 + 2 + 2;
        b.extend_from_slice(&code_attr_len.to_be_bytes());
        b.extend_from_slice(&1u16.to_be_bytes()); // max_stack
        b.extend_from_slice(&1u16.to_be_bytes()); // max_locals
        b.extend_from_slice(&(code.len() as u32).to_be_bytes());
        b.extend_from_slice(&code);
        b.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
        b.extend_from_slice(&0u16.to_be_bytes()); // attributes_count (nested)

        b.extend_from_slice(&0u16.to_be_bytes()); // class attributes_count
        b
    }

    fn push_utf8(b: &mut Vec<u8>, s: &str) {
        b.push(1);
        b.extend_from_slice(&(s.len() as u16).to_be_bytes());
        b.extend_from_slice(s.as_bytes());
    }

    #[test]
    fn parses_a_minimal_class_file() {
        let bytes = minimal_class_bytes();
        let class_file = ClassFileParser::parse(&bytes).unwrap();
        assert_eq!(class_file.this_class_name().unwrap(), "Test");
        assert_eq!(class_file.methods.len(), 1);
        let method = &class_file.methods[0];
        assert_eq!(method.name, "f");
        assert_eq!(method.descriptor, "()V");
        assert!(method.is_static());
        let code_attr = method.attributes.code().unwrap();
        match code_attr {
            AttributeInfo::Code { code, max_stack, max_locals, .. } => {
                assert_eq!(code, &vec![0xB1]);
                assert_eq!(*max_stack, 1);
                assert_eq!(*max_locals, 1);
            }
            _ => panic!("expected Code attribute"),
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = minimal_class_bytes();
        bytes[0] = 0x00;
        assert!(matches!(ClassFileParser::parse(&bytes), Err(VmError::InvalidMagic)));
    }

    #[test]
    fn long_and_double_entries_occupy_two_constant_pool_slots() {
        let mut b = Vec::new();
        b.extend_from_slice(&CLASS_FILE_MAGIC.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&52u16.to_be_bytes());
        b.extend_from_slice(&4u16.to_be_bytes()); // count = 4 -> slots 1..3, #2 reserved
        push_utf8(&mut b, "Test");
        b.push(5); // Long
        b.extend_from_slice(&1i64.to_be_bytes());
        b.extend_from_slice(&0x0021u16.to_be_bytes());
        b.extend_from_slice(&1u16.to_be_bytes()); // this_class -> #1 (not a real Class entry, fine for this test)
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());

        let class_file = ClassFileParser::parse(&b).unwrap();
        assert_eq!(class_file.constant_pool.len(), 4);
        assert!(matches!(class_file.constant_pool.entry(2).unwrap(), CpInfo::Long(1)));
        assert!(matches!(class_file.constant_pool.entry(3).unwrap(), CpInfo::Empty));
    }
}
