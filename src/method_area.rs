//! The method area: a process-wide arena owning every parsed `ClassFile` and linked `Klass`,
//! keyed by `(loader_id, fully-qualified class name)`.
//!
//! Grounded in `original_source/class_loader/method_area.h`'s role as the shared storage behind
//! every class loader, adapted to Rust's ownership rules with a two-phase reserve/attach protocol:
//! `reserve` boxes a freshly parsed `ClassFile` and hands back a stable `*const ClassFile` the
//! caller can use to build a `Klass` against; `attach_klass` boxes that finished `Klass` and
//! records it under the same key. Both phases rely on the fact that growing a `Vec<Box<T>>`
//! reallocates the `Vec`'s own backing storage, not the heap allocation each `Box` points at, so
//! pointers handed out earlier stay valid for the method area's entire lifetime.
//!
//! This is an explicit, non-singleton registry (one per `Vm`/test), unlike
//! `original_source`'s single shared instance, to keep tests hermetic.

use std::collections::HashMap;

use crate::class_file::ClassFile;
use crate::klass::Klass;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClassKey {
    loader_id: usize,
    name: String,
}

#[derive(Default)]
pub struct MethodArea {
    class_files: Vec<Box<ClassFile>>,
    klasses: Vec<Box<Klass>>,
    reserved: HashMap<ClassKey, *const ClassFile>,
    attached: HashMap<ClassKey, *mut Klass>,
}

// The method area only ever hands out pointers into its own `Box`es, which it owns for its
// entire lifetime; nothing here is actually shared across threads yet, but the pointer graph
// itself is no more dangerous to move than any other owning container.
unsafe impl Send for MethodArea {}

impl MethodArea {
    pub fn new() -> Self {
        MethodArea::default()
    }

    /// Boxes `class_file` and registers it under `(loader_id, name)`, returning a stable pointer
    /// a `Klass` can be built against. Panics if the same key is reserved twice; a class loader
    /// should always consult `has_class` first.
    pub fn reserve(&mut self, loader_id: usize, name: &str, class_file: ClassFile) -> *const ClassFile {
        let key = ClassKey { loader_id, name: name.to_string() };
        assert!(!self.reserved.contains_key(&key), "class already reserved: {name}");
        let boxed = Box::new(class_file);
        let ptr: *const ClassFile = &*boxed;
        self.class_files.push(boxed);
        self.reserved.insert(key, ptr);
        ptr
    }

    /// Boxes the finished `klass` and registers it under `(loader_id, name)`, returning a stable
    /// pointer other `Klass`es' `super_class`/`interfaces` fields can reference.
    pub fn attach_klass(&mut self, loader_id: usize, name: &str, klass: Klass) -> *mut Klass {
        let key = ClassKey { loader_id, name: name.to_string() };
        let mut boxed = Box::new(klass);
        let ptr: *mut Klass = &mut *boxed;
        self.klasses.push(boxed);
        self.attached.insert(key, ptr);
        ptr
    }

    pub fn get_class_file(&self, loader_id: usize, name: &str) -> Option<*const ClassFile> {
        let key = ClassKey { loader_id, name: name.to_string() };
        self.reserved.get(&key).copied()
    }

    pub fn get_class(&self, loader_id: usize, name: &str) -> Option<*mut Klass> {
        let key = ClassKey { loader_id, name: name.to_string() };
        self.attached.get(&key).copied()
    }

    pub fn has_class(&self, loader_id: usize, name: &str) -> bool {
        let key = ClassKey { loader_id, name: name.to_string() };
        self.attached.contains_key(&key)
    }

    /// Drops every class file and klass this method area owns. Only meaningful in tests, where a
    /// fresh `Vm` per test is wasteful but a fresh method area per test is cheap.
    pub fn reset(&mut self) {
        self.reserved.clear();
        self.attached.clear();
        self.class_files.clear();
        self.klasses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeTable;
    use crate::constant_pool::ConstantPool;
    use crate::version::Version;

    fn empty_class_file() -> ClassFile {
        ClassFile {
            magic: crate::class_file::CLASS_FILE_MAGIC,
            version: Version::new(52, 0),
            constant_pool: ConstantPool::new(vec![crate::constant_pool::CpInfo::Empty]),
            access_flags: 0,
            this_class_index: 0,
            super_class_index: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: AttributeTable::default(),
        }
    }

    #[test]
    fn reserved_pointer_survives_further_reservations() {
        let mut area = MethodArea::new();
        let first = area.reserve(0, "A", empty_class_file());
        for i in 0..64 {
            area.reserve(0, &format!("Filler{i}"), empty_class_file());
        }
        assert!(area.get_class_file(0, "A").is_some());
        let refetched = area.get_class_file(0, "A").unwrap();
        assert_eq!(first, refetched);
        unsafe {
            assert_eq!((*first).access_flags, 0);
        }
    }

    #[test]
    fn classes_are_scoped_per_loader() {
        let mut area = MethodArea::new();
        area.reserve(0, "A", empty_class_file());
        assert!(area.get_class_file(0, "A").is_some());
        assert!(area.get_class_file(1, "A").is_none());
    }
}
