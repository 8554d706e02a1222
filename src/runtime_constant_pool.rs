//! The runtime constant pool (JVMS §5.1): a lazily-resolving view over a `Klass`'s static
//! constant pool.
//!
//! Grounded in `original_source/runtime/runtime_constant_pool.h`'s `RuntimeConstantPool(Klass*
//! owner_klass)`: resolution methods live directly on this type, not on `Klass`, and each
//! symbolic entry mutates in place into its resolved form the first time it is touched —
//! resolution is monotonic and idempotent, matching the original's own "resolve once, cache
//! forever" behavior. Like `Method`/`Field`, `owner` starts null and is fixed up by
//! `klass::fixup_owner_pointers` once the owning `Klass` has a stable address.

use crate::class_loader::ClassLoader;
use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{VmError, VmResult};
use crate::field::Field;
use crate::klass::Klass;
use crate::method::Method;
use crate::types::{Jdouble, Jfloat, Jint, Jlong};

#[derive(Clone)]
pub enum RcpEntry {
    Empty,
    Integer(Jint),
    Float(Jfloat),
    Long(Jlong),
    Double(Jdouble),
    /// A `String` entry always resolves to `JREF_NULL`; there is no heap to intern it into.
    StringRef,
    Class {
        name: String,
        resolved: Option<*mut Klass>,
    },
    Field {
        class_name: String,
        name: String,
        descriptor: String,
        resolved: Option<*mut Field>,
    },
    Method {
        class_name: String,
        name: String,
        descriptor: String,
        resolved: Option<*mut Method>,
    },
    InterfaceMethod {
        class_name: String,
        name: String,
        descriptor: String,
        resolved: Option<*mut Method>,
    },
    /// `MethodHandle`/`MethodType`/`InvokeDynamic` entries: recorded but never resolved, since
    /// `invokedynamic` itself is a decode-only stub.
    Unsupported,
}

/// What a resolved `LDC`-family entry turns into on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadableConstant {
    Int(Jint),
    Float(Jfloat),
    Long(Jlong),
    Double(Jdouble),
    NullRef,
}

pub struct RuntimeConstantPool {
    pub owner: *mut Klass,
    entries: Vec<RcpEntry>,
}

impl RuntimeConstantPool {
    /// Builds the runtime constant pool from the class file's static constant pool, resolving
    /// every symbolic reference's *names* eagerly (so later resolution never needs the static
    /// pool again) while leaving the referenced `Klass`/`Field`/`Method` pointers unresolved.
    pub fn prepare(cp: &ConstantPool) -> RuntimeConstantPool {
        let mut entries = Vec::with_capacity(cp.len());
        for index in 0..cp.len() {
            let index = index as u16;
            let entry = match cp.entry(index) {
                Ok(info) => rcp_entry_from_cp_info(cp, info),
                Err(_) => RcpEntry::Empty,
            };
            entries.push(entry);
        }
        RuntimeConstantPool { owner: std::ptr::null_mut(), entries }
    }

    fn entry(&self, index: u16) -> VmResult<&RcpEntry> {
        self.entries
            .get(index as usize)
            .ok_or_else(|| VmError::OutOfBounds(format!("runtime constant pool index {index} out of range")))
    }

    fn entry_mut(&mut self, index: u16) -> VmResult<&mut RcpEntry> {
        self.entries
            .get_mut(index as usize)
            .ok_or_else(|| VmError::OutOfBounds(format!("runtime constant pool index {index} out of range")))
    }

    pub fn get_int(&self, index: u16) -> VmResult<Jint> {
        match self.entry(index)? {
            RcpEntry::Integer(v) => Ok(*v),
            _ => Err(VmError::MalformedClass(format!("expected Integer at runtime constant pool index {index}"))),
        }
    }

    pub fn get_float(&self, index: u16) -> VmResult<Jfloat> {
        match self.entry(index)? {
            RcpEntry::Float(v) => Ok(*v),
            _ => Err(VmError::MalformedClass(format!("expected Float at runtime constant pool index {index}"))),
        }
    }

    pub fn get_long(&self, index: u16) -> VmResult<Jlong> {
        match self.entry(index)? {
            RcpEntry::Long(v) => Ok(*v),
            _ => Err(VmError::MalformedClass(format!("expected Long at runtime constant pool index {index}"))),
        }
    }

    pub fn get_double(&self, index: u16) -> VmResult<Jdouble> {
        match self.entry(index)? {
            RcpEntry::Double(v) => Ok(*v),
            _ => Err(VmError::MalformedClass(format!("expected Double at runtime constant pool index {index}"))),
        }
    }

    pub fn is_string_ref(&self, index: u16) -> VmResult<bool> {
        Ok(matches!(self.entry(index)?, RcpEntry::StringRef))
    }

    /// What `LDC`/`LDC_W`/`LDC2_W` push for a literal entry. `String` entries have no heap to
    /// intern into, so they resolve to `NullRef` rather than an actual `java.lang.String`.
    pub fn loadable_constant(&self, index: u16) -> VmResult<LoadableConstant> {
        match self.entry(index)? {
            RcpEntry::Integer(v) => Ok(LoadableConstant::Int(*v)),
            RcpEntry::Float(v) => Ok(LoadableConstant::Float(*v)),
            RcpEntry::Long(v) => Ok(LoadableConstant::Long(*v)),
            RcpEntry::Double(v) => Ok(LoadableConstant::Double(*v)),
            RcpEntry::StringRef => Ok(LoadableConstant::NullRef),
            _ => Err(VmError::MalformedClass(format!("constant pool index {index} is not loadable via ldc"))),
        }
    }

    /// Resolves (and caches) the `Klass` named by the `Class` entry at `index`.
    pub fn resolve_class(&mut self, index: u16, loader: &mut ClassLoader) -> VmResult<*mut Klass> {
        let name = match self.entry(index)? {
            RcpEntry::Class { resolved: Some(k), .. } => return Ok(*k),
            RcpEntry::Class { name, .. } => name.clone(),
            _ => return Err(VmError::MalformedClass(format!("expected Class at runtime constant pool index {index}"))),
        };
        let klass = loader.load_class(&name)?;
        if let RcpEntry::Class { resolved, .. } = self.entry_mut(index)? {
            *resolved = Some(klass);
        }
        Ok(klass)
    }

    /// Resolves (and caches) the `Field` named by the `Fieldref` entry at `index`, first
    /// resolving its declaring class.
    pub fn resolve_field(&mut self, index: u16, loader: &mut ClassLoader) -> VmResult<*mut Field> {
        if let RcpEntry::Field { resolved: Some(f), .. } = self.entry(index)? {
            return Ok(*f);
        }
        let (class_name, name, descriptor) = match self.entry(index)? {
            RcpEntry::Field { class_name, name, descriptor, .. } => {
                (class_name.clone(), name.clone(), descriptor.clone())
            }
            _ => return Err(VmError::MalformedClass(format!("expected Fieldref at runtime constant pool index {index}"))),
        };
        let klass = loader.load_class(&class_name)?;
        let field = unsafe { &*klass }
            .find_field(&name, &descriptor)
            .ok_or_else(|| VmError::FieldNotFound { class: class_name.clone(), name: name.clone(), descriptor: descriptor.clone() })?
            as *mut Field;
        if let RcpEntry::Field { resolved, .. } = self.entry_mut(index)? {
            *resolved = Some(field);
        }
        Ok(field)
    }

    /// Resolves (and caches) the `Method` named by the `Methodref` entry at `index`.
    pub fn resolve_method(&mut self, index: u16, loader: &mut ClassLoader) -> VmResult<*mut Method> {
        if let RcpEntry::Method { resolved: Some(m), .. } = self.entry(index)? {
            return Ok(*m);
        }
        let (class_name, name, descriptor) = match self.entry(index)? {
            RcpEntry::Method { class_name, name, descriptor, .. } => {
                (class_name.clone(), name.clone(), descriptor.clone())
            }
            _ => return Err(VmError::MalformedClass(format!("expected Methodref at runtime constant pool index {index}"))),
        };
        let klass = loader.load_class(&class_name)?;
        let method = unsafe { &*klass }
            .find_method(&name, &descriptor)
            .ok_or_else(|| VmError::MethodNotFound { class: class_name.clone(), name: name.clone(), descriptor: descriptor.clone() })?
            as *mut Method;
        if let RcpEntry::Method { resolved, .. } = self.entry_mut(index)? {
            *resolved = Some(method);
        }
        Ok(method)
    }

    /// Resolves (and caches) the `Method` named by the `InterfaceMethodref` entry at `index`.
    /// Uses the same super-chain-only search as `resolve_method`; there is no separate interface
    /// method table to consult.
    pub fn resolve_interface_method(&mut self, index: u16, loader: &mut ClassLoader) -> VmResult<*mut Method> {
        if let RcpEntry::InterfaceMethod { resolved: Some(m), .. } = self.entry(index)? {
            return Ok(*m);
        }
        let (class_name, name, descriptor) = match self.entry(index)? {
            RcpEntry::InterfaceMethod { class_name, name, descriptor, .. } => {
                (class_name.clone(), name.clone(), descriptor.clone())
            }
            _ => return Err(VmError::MalformedClass(format!("expected InterfaceMethodref at runtime constant pool index {index}"))),
        };
        let klass = loader.load_class(&class_name)?;
        let method = unsafe { &*klass }
            .find_method(&name, &descriptor)
            .ok_or_else(|| VmError::MethodNotFound { class: class_name.clone(), name: name.clone(), descriptor: descriptor.clone() })?
            as *mut Method;
        if let RcpEntry::InterfaceMethod { resolved, .. } = self.entry_mut(index)? {
            *resolved = Some(method);
        }
        Ok(method)
    }
}

fn rcp_entry_from_cp_info(cp: &ConstantPool, info: &CpInfo) -> RcpEntry {
    match info {
        CpInfo::Empty | CpInfo::Utf8(_) | CpInfo::NameAndType { .. } => RcpEntry::Empty,
        CpInfo::Integer(v) => RcpEntry::Integer(*v),
        CpInfo::Float(v) => RcpEntry::Float(*v),
        CpInfo::Long(v) => RcpEntry::Long(*v),
        CpInfo::Double(v) => RcpEntry::Double(*v),
        CpInfo::String { .. } => RcpEntry::StringRef,
        CpInfo::Class { name_index } => RcpEntry::Class {
            name: cp.utf8(*name_index).unwrap_or_default().replace('/', "."),
            resolved: None,
        },
        CpInfo::Fieldref { class_index, name_and_type_index } => {
            let (class_name, name, descriptor) = resolve_member_ref(cp, *class_index, *name_and_type_index);
            RcpEntry::Field { class_name, name, descriptor, resolved: None }
        }
        CpInfo::Methodref { class_index, name_and_type_index } => {
            let (class_name, name, descriptor) = resolve_member_ref(cp, *class_index, *name_and_type_index);
            RcpEntry::Method { class_name, name, descriptor, resolved: None }
        }
        CpInfo::InterfaceMethodref { class_index, name_and_type_index } => {
            let (class_name, name, descriptor) = resolve_member_ref(cp, *class_index, *name_and_type_index);
            RcpEntry::InterfaceMethod { class_name, name, descriptor, resolved: None }
        }
        CpInfo::MethodHandle { .. } | CpInfo::MethodType { .. } | CpInfo::InvokeDynamic { .. } => RcpEntry::Unsupported,
    }
}

fn resolve_member_ref(cp: &ConstantPool, class_index: u16, name_and_type_index: u16) -> (String, String, String) {
    let class_name = cp.class_name(class_index).unwrap_or_default().replace('/', ".");
    let (name, descriptor) = cp
        .name_and_type(name_and_type_index)
        .map(|(n, d)| (n.to_string(), d.to_string()))
        .unwrap_or_default();
    (class_name, name, descriptor)
}
