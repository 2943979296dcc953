//! The process-wide type registry.
//!
//! Two-phase lifecycle: a [`TypeRegistryBuilder`] accepts registrations
//! during single-threaded startup, then [`TypeRegistryBuilder::build`]
//! freezes it into an immutable [`TypeRegistry`] that is safe to share
//! across threads for the rest of the process lifetime. No lookup during
//! a pack/unpack pass ever takes a lock.
//!
//! A type absent from the registry cannot be serialized or reconstructed;
//! that is a programming error surfaced as [`RegistryError::UnknownType`],
//! never silent data loss.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::id::TypeId;
use crate::shared::Serializable;
use crate::track::SharedEntry;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{type_id} ({name}) is already registered")]
    DuplicateType { type_id: TypeId, name: &'static str },
    #[error("type name {0:?} is already registered")]
    DuplicateName(&'static str),
    #[error("{0} is reserved and cannot be registered")]
    ReservedTypeId(TypeId),
    #[error("{0} is not registered")]
    UnknownType(TypeId),
    #[error("factory for {declared} produced an instance reporting {reported}")]
    MismatchedTypeId { declared: TypeId, reported: TypeId },
}

/// Ownership kind of a serializable field, as declared in its type's
/// descriptor list. Registry metadata only: the authoritative field order
/// is the type's `serialize_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Primitive,
    OwnedValue,
    OwnedPointer,
    SharedPointer,
    WeakReference,
    Container,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Primitive => "primitive",
            FieldKind::OwnedValue => "owned_value",
            FieldKind::OwnedPointer => "owned_pointer",
            FieldKind::SharedPointer => "shared_pointer",
            FieldKind::WeakReference => "weak_reference",
            FieldKind::Container => "container",
        }
    }
}

/// One declared field of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

type BoxFactory = fn() -> Box<dyn Serializable>;
type SharedFactory = fn() -> SharedEntry;

/// Registry entry: stable identifier, name, field descriptors, and the
/// construction hooks used while decoding polymorphic references.
pub struct TypeRecord {
    type_id: TypeId,
    name: &'static str,
    fields: &'static [FieldDescriptor],
    make_boxed: BoxFactory,
    make_shared: SharedFactory,
}

impl TypeRecord {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    pub(crate) fn instantiate_boxed(&self) -> Box<dyn Serializable> {
        (self.make_boxed)()
    }

    pub(crate) fn instantiate_shared(&self) -> SharedEntry {
        (self.make_shared)()
    }
}

impl std::fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRecord")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}

fn make_boxed<T: Serializable + Default>() -> Box<dyn Serializable> {
    Box::new(T::default())
}

fn make_shared<T: Serializable + Default>() -> SharedEntry {
    SharedEntry::from_rc(Rc::new(RefCell::new(T::default())))
}

/// Startup-phase registry under construction.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    records: Vec<TypeRecord>,
    by_id: HashMap<TypeId, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete serializable type under a stable identifier.
    /// Fails if the identifier or name is already taken.
    pub fn register<T: Serializable + Default>(
        &mut self,
        type_id: TypeId,
        name: &'static str,
        fields: &'static [FieldDescriptor],
    ) -> Result<(), RegistryError> {
        if type_id == TypeId::NULL {
            return Err(RegistryError::ReservedTypeId(type_id));
        }
        if let Some(&idx) = self.by_id.get(&type_id) {
            return Err(RegistryError::DuplicateType {
                type_id,
                name: self.records[idx].name,
            });
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name));
        }
        let idx = self.records.len();
        self.records.push(TypeRecord {
            type_id,
            name,
            fields,
            make_boxed: make_boxed::<T>,
            make_shared: make_shared::<T>,
        });
        self.by_id.insert(type_id, idx);
        self.by_name.insert(name, idx);
        Ok(())
    }

    /// Freeze the registry. Validates that every factory constructs an
    /// instance reporting the identifier it was registered under.
    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        for record in &self.records {
            let reported = record.instantiate_boxed().type_id();
            if reported != record.type_id {
                return Err(RegistryError::MismatchedTypeId {
                    declared: record.type_id,
                    reported,
                });
            }
        }
        Ok(TypeRegistry {
            records: self.records,
            by_id: self.by_id,
            by_name: self.by_name,
        })
    }
}

/// Immutable registry. Frozen after build(); safe to share via `Arc` and
/// read concurrently from any number of passes.
#[derive(Debug)]
pub struct TypeRegistry {
    records: Vec<TypeRecord>,
    by_id: HashMap<TypeId, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl TypeRegistry {
    pub fn resolve(&self, type_id: TypeId) -> Result<&TypeRecord, RegistryError> {
        self.by_id
            .get(&type_id)
            .map(|&idx| &self.records[idx])
            .ok_or(RegistryError::UnknownType(type_id))
    }

    pub fn resolve_name(&self, name: &str) -> Option<&TypeRecord> {
        self.by_name.get(name).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.by_id.contains_key(&type_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TypeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
