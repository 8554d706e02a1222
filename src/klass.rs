//! The runtime representation of a linked class: `original_source/runtime/klass.h`'s `Klass`,
//! adapted to the method area's pointer-graph storage.
//!
//! A `Klass` is built in two steps, because Rust (unlike the C++ `original_source` it's grounded
//! in) has no `this`-available-during-construction: `build` produces a `Klass` value whose
//! `Method`/`Field`/`RuntimeConstantPool` members all carry a null `owner`, then the caller
//! (`ClassLoader::load_class`) boxes that value through `MethodArea::attach_klass` to get a
//! stable address, and finally calls `fixup_owner_pointers` to point every member back at that
//! address.

use crate::class_file::ClassFile;
use crate::error::{VmError, VmResult};
use crate::field::Field;
use crate::members::{ACC_ABSTRACT, ACC_NATIVE, ACC_STATIC};
use crate::method::Method;
use crate::runtime_constant_pool::RuntimeConstantPool;
use crate::types::Slot;

pub struct Klass {
    pub loader_id: usize,
    pub class_file: *const ClassFile,
    pub super_class: *mut Klass,
    pub interfaces: Vec<*mut Klass>,
    pub runtime_constant_pool: RuntimeConstantPool,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub static_slots: Vec<Slot>,
    /// Total instance-slot width; instance storage itself is out of scope (no heap), but the
    /// count is still recorded so a future object layout has a ready-made size to allocate.
    pub instance_slot_count: usize,
    pub name: String,
}

impl Klass {
    pub fn class_file(&self) -> &ClassFile {
        unsafe { &*self.class_file }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Walks this klass then its super chain (JVMS §5.4.3.3 simple-case method resolution; no
    /// interface default-method search, per the recorded decision to leave interface dispatch
    /// unimplemented alongside `INVOKEINTERFACE`'s decode-only stub).
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<*const Method> {
        if let Some(m) = self.methods.iter().find(|m| m.name == name && m.descriptor == descriptor) {
            return Some(m as *const Method);
        }
        if self.super_class.is_null() {
            return None;
        }
        unsafe { (*self.super_class).find_method(name, descriptor) }
    }

    /// Walks this klass then its super chain (JVMS §5.4.3.2 simple-case field resolution; no
    /// interface field search).
    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<*const Field> {
        if let Some(f) = self.fields.iter().find(|f| f.name == name && f.descriptor == descriptor) {
            return Some(f as *const Field);
        }
        if self.super_class.is_null() {
            return None;
        }
        unsafe { (*self.super_class).find_field(name, descriptor) }
    }
}

/// Builds a `Klass` value from its already-parsed `ClassFile` and already-linked super/interface
/// klasses. The returned value's `Method`/`Field`/`RuntimeConstantPool.owner` pointers are all
/// null; the caller must box it and call `fixup_owner_pointers` before it is safe to use.
///
/// Fails with `MalformedClass` if a non-native, non-abstract method has no `Code` attribute
/// (JVMS requires one; §4.5 of the governing design doc).
pub fn build(loader_id: usize, class_file: *const ClassFile, super_class: *mut Klass, interfaces: Vec<*mut Klass>) -> VmResult<Klass> {
    let cf = unsafe { &*class_file };

    let runtime_constant_pool = RuntimeConstantPool::prepare(&cf.constant_pool);

    let mut methods = Vec::with_capacity(cf.methods.len());
    for m in &cf.methods {
        let (max_stack, max_locals, code) = match m.attributes.code() {
            Some(crate::attributes::AttributeInfo::Code { max_stack, max_locals, code, .. }) => {
                (*max_stack, *max_locals, code.clone())
            }
            None if m.access_flags & (ACC_NATIVE | ACC_ABSTRACT) != 0 => (0, 0, Vec::new()),
            None => {
                return Err(VmError::MalformedClass(format!(
                    "{}.{}{} is neither native nor abstract but has no Code attribute",
                    cf.this_class_name().unwrap_or_default(),
                    m.name,
                    m.descriptor
                )))
            }
        };
        methods.push(Method {
            owner: std::ptr::null_mut(),
            name: m.name.clone(),
            descriptor: m.descriptor.clone(),
            access_flags: m.access_flags,
            max_stack,
            max_locals,
            code,
        });
    }

    let mut static_slot_index = 0usize;
    let mut instance_slot_index = 0usize;
    let mut fields = Vec::with_capacity(cf.fields.len());
    for f in &cf.fields {
        let width = if f.descriptor == "J" || f.descriptor == "D" { 2 } else { 1 };
        let slot_index = if f.access_flags & ACC_STATIC != 0 {
            let i = static_slot_index;
            static_slot_index += width;
            i
        } else {
            let i = instance_slot_index;
            instance_slot_index += width;
            i
        };
        fields.push(Field {
            owner: std::ptr::null_mut(),
            name: f.name.clone(),
            descriptor: f.descriptor.clone(),
            access_flags: f.access_flags,
            slot_index,
        });
    }

    let name = cf.this_class_name().unwrap_or_default().to_string();

    Ok(Klass {
        loader_id,
        class_file,
        super_class,
        interfaces,
        runtime_constant_pool,
        methods,
        fields,
        static_slots: vec![Slot::default(); static_slot_index],
        instance_slot_count: instance_slot_index,
        name,
    })
}

/// Points every member's `owner` pointer at `klass_ptr`, which must have just been produced by
/// `MethodArea::attach_klass` and must not move again.
pub fn fixup_owner_pointers(klass_ptr: *mut Klass) {
    unsafe {
        let klass = &mut *klass_ptr;
        for method in klass.methods.iter_mut() {
            method.owner = klass_ptr;
        }
        for field in klass.fields.iter_mut() {
            field.owner = klass_ptr;
        }
        klass.runtime_constant_pool.owner = klass_ptr;
    }
}
