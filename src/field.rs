//! A linked field, as it hangs off a `Klass`.
//!
//! Grounded in `original_source/runtime/field.h`'s `Field*`: like `Method`, `owner` starts null
//! and is fixed up once the declaring `Klass` has a stable address. `slot_index` is this field's
//! position within its owner's `static_slots` (for a static field) or within an instance's future
//! instance-slot layout (for an instance field) — instance storage itself is out of scope here
//! (no heap), so `slot_index` only does real work for statics.

use crate::klass::Klass;
use crate::members::ACC_STATIC;

pub struct Field {
    pub owner: *mut Klass,
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
    pub slot_index: usize,
}

impl Field {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}
