//! Shared and weak references, and the polymorphic dispatch they ride on.
//!
//! Every reference-kind field is one identity token on the wire. The
//! first occurrence of an object assigns the next sequential identity,
//! registers it with the context's object table *before* recursing into
//! the object's fields (that rule is what terminates cycles), and then
//! emits the full encoding. Every later occurrence emits the token alone.
//! Unpacking mirrors this exactly: a fresh identity allocates and
//! registers an instance before populating it, a known identity resolves
//! to the already-allocated instance.
//!
//! Polymorphic references (`Shared<dyn Serializable>`,
//! `Box<dyn Serializable>`) additionally carry the concrete type id and
//! construct through the registry; the registry is consulted before any
//! bytes of the record are written, so an unregistered type fails with a
//! clean stream.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::context::{Mode, SerError, Serializer};
use crate::id::{ObjectId, TypeId};
use crate::serialize::Serialize;
use crate::track::{Resolved, SharedEntry};
use crate::wire::FormatError;

/// An object that can appear behind polymorphic and shared references.
///
/// `serialize_order` declares the one field order used by both packing
/// and unpacking; `type_id` reports the identifier the type is registered
/// under. The `as_any` pair recovers the concrete type from a trait
/// object after decoding.
pub trait Serializable: 'static {
    fn type_id(&self) -> TypeId;
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Placeholder behind default-constructed polymorphic references. It
/// reports the reserved null type id, so packing one fails as an
/// unregistered type; decoding always overwrites it before it can be
/// observed.
#[derive(Debug, Default)]
struct NullObject;

impl Serializable for NullObject {
    fn type_id(&self) -> TypeId {
        TypeId::NULL
    }
    fn serialize_order(&mut self, _ser: &mut Serializer<'_>) -> Result<(), SerError> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Shared-ownership reference to a serializable object. Multiple `Shared`
/// handles to one object encode as one identity and decode to one
/// reconstructed instance.
pub struct Shared<T: Serializable + ?Sized>(Rc<RefCell<T>>);

impl<T: Serializable> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Rc::new(RefCell::new(value)))
    }

    /// Erase the static type. The referent keeps its identity: a graph
    /// may hold the same object through both typed and erased handles.
    pub fn into_dyn(self) -> Shared<dyn Serializable> {
        let rc: Rc<RefCell<dyn Serializable>> = self.0;
        Shared(rc)
    }
}

impl<T: Serializable + ?Sized> Shared<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef(Some(Rc::downgrade(&self.0)))
    }

    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl Shared<dyn Serializable> {
    /// Concrete runtime type of the referent.
    pub fn concrete_type_id(&self) -> TypeId {
        // UFCS: `Any::type_id` is also a candidate on trait objects
        Serializable::type_id(&*self.0.borrow())
    }
}

impl<T: Serializable + ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Rc::clone(&self.0))
    }
}

impl<T: Serializable + Default> Default for Shared<T> {
    fn default() -> Self {
        Shared::new(T::default())
    }
}

impl Default for Shared<dyn Serializable> {
    fn default() -> Self {
        let rc: Rc<RefCell<dyn Serializable>> = Rc::new(RefCell::new(NullObject));
        Shared(rc)
    }
}

impl<T: Serializable + ?Sized> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:p})", Rc::as_ptr(&self.0))
    }
}

// ---------------------------------------------------------------------------
// WeakRef
// ---------------------------------------------------------------------------

/// Non-owning back reference. Encoded identically to an owning
/// reference, but decoding one never extends the referent's lifetime
/// beyond the pass: once the context drops its table, an object held
/// only weakly is released.
pub struct WeakRef<T: Serializable + ?Sized>(Option<Weak<RefCell<T>>>);

impl<T: Serializable + ?Sized> WeakRef<T> {
    /// An empty reference; upgrades to `None`.
    pub fn new() -> Self {
        WeakRef(None)
    }

    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.0.as_ref().and_then(|weak| weak.upgrade()).map(Shared)
    }
}

impl<T: Serializable + ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        WeakRef(None)
    }
}

impl<T: Serializable + ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        WeakRef(self.0.clone())
    }
}

impl<T: Serializable + ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(weak) => write!(f, "WeakRef({:p})", weak.as_ptr()),
            None => write!(f, "WeakRef(null)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference codec
// ---------------------------------------------------------------------------

fn rc_addr<T: ?Sized>(rc: &Rc<RefCell<T>>) -> usize {
    Rc::as_ptr(rc).cast::<u8>() as usize
}

fn pack_concrete_ref<T: Serializable>(
    rc: &Rc<RefCell<T>>,
    ser: &mut Serializer<'_>,
) -> Result<(), SerError> {
    let addr = rc_addr(rc);
    match ser.table.lookup_addr(addr) {
        Some(id) => ser.put_u64(id.0),
        None => {
            // register before recursing: a back-reference to this object
            // from inside its own fields must find it in the table
            let id = ser.table.assign(addr);
            ser.put_u64(id.0)?;
            rc.borrow_mut().serialize_order(ser)
        }
    }
}

/// `Ok(None)` is the null sentinel; callers decide whether that is legal
/// at their site.
fn unpack_concrete_ref<T: Serializable + Default>(
    ser: &mut Serializer<'_>,
) -> Result<Option<Rc<RefCell<T>>>, SerError> {
    let token_at = ser.offset();
    let id = ObjectId(ser.get_u64()?);
    match ser.table.classify(id)? {
        Resolved::Null => Ok(None),
        Resolved::Known => {
            let rc = ser.table.decoded_concrete::<T>(id).ok_or(FormatError::BackRefType {
                id,
                offset: token_at,
            })?;
            Ok(Some(rc))
        }
        Resolved::Fresh => {
            let rc = Rc::new(RefCell::new(T::default()));
            ser.table
                .register_decoded(SharedEntry::from_rc(Rc::clone(&rc)));
            rc.borrow_mut().serialize_order(ser)?;
            Ok(Some(rc))
        }
    }
}

fn pack_dyn_ref(
    rc: &Rc<RefCell<dyn Serializable>>,
    ser: &mut Serializer<'_>,
) -> Result<(), SerError> {
    let addr = rc_addr(rc);
    match ser.table.lookup_addr(addr) {
        Some(id) => ser.put_u64(id.0),
        None => {
            // resolve before writing anything so an unregistered type
            // fails with a clean stream
            let type_id = Serializable::type_id(&*rc.borrow());
            let name = ser.registry.resolve(type_id)?.name();
            let start = ser.offset();
            let id = ser.table.assign(addr);
            ser.put_u64(id.0)?;
            ser.put_u32(type_id.0)?;
            rc.borrow_mut().serialize_order(ser)?;
            let end = ser.offset();
            ser.record_segment(name, type_id, start, end);
            Ok(())
        }
    }
}

fn unpack_dyn_ref(
    ser: &mut Serializer<'_>,
) -> Result<Option<Rc<RefCell<dyn Serializable>>>, SerError> {
    let id = ObjectId(ser.get_u64()?);
    match ser.table.classify(id)? {
        Resolved::Null => Ok(None),
        Resolved::Known => Ok(Some(ser.table.decoded_dyn(id))),
        Resolved::Fresh => {
            let type_id = TypeId(ser.get_u32()?);
            let entry = ser.registry.resolve(type_id)?.instantiate_shared();
            let id = ser.table.register_decoded(entry);
            let rc = ser.table.decoded_dyn(id);
            rc.borrow_mut().serialize_order(ser)?;
            Ok(Some(rc))
        }
    }
}

impl<T: Serializable + Default> Serialize for Shared<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => pack_concrete_ref(&self.0, ser),
            Mode::Unpack => {
                let token_at = ser.offset();
                match unpack_concrete_ref::<T>(ser)? {
                    Some(rc) => {
                        self.0 = rc;
                        Ok(())
                    }
                    None => Err(FormatError::NullRef { offset: token_at }.into()),
                }
            }
        }
    }
}

impl Serialize for Shared<dyn Serializable> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => pack_dyn_ref(&self.0, ser),
            Mode::Unpack => {
                let token_at = ser.offset();
                match unpack_dyn_ref(ser)? {
                    Some(rc) => {
                        self.0 = rc;
                        Ok(())
                    }
                    None => Err(FormatError::NullRef { offset: token_at }.into()),
                }
            }
        }
    }
}

impl<T: Serializable + Default> Serialize for WeakRef<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => match self.0.as_ref().and_then(|weak| weak.upgrade()) {
                Some(rc) => pack_concrete_ref(&rc, ser),
                None => ser.put_u64(ObjectId::NULL.0),
            },
            Mode::Unpack => {
                self.0 = unpack_concrete_ref::<T>(ser)?.map(|rc| Rc::downgrade(&rc));
                Ok(())
            }
        }
    }
}

impl Serialize for WeakRef<dyn Serializable> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => match self.0.as_ref().and_then(|weak| weak.upgrade()) {
                Some(rc) => pack_dyn_ref(&rc, ser),
                None => ser.put_u64(ObjectId::NULL.0),
            },
            Mode::Unpack => {
                self.0 = unpack_dyn_ref(ser)?.map(|rc| Rc::downgrade(&rc));
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Owned pointers
// ---------------------------------------------------------------------------

// Owned pointers carry no identity token: Rust ownership cannot express
// owned aliasing or owned cycles, so the pointee is encoded inline.
impl<T: Serialize + Default> Serialize for Box<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        (**self).serialize(ser)
    }
}

impl Serialize for Box<dyn Serializable> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                let type_id = Serializable::type_id(&**self);
                let name = ser.registry.resolve(type_id)?.name();
                let start = ser.offset();
                ser.put_u32(type_id.0)?;
                self.serialize_order(ser)?;
                let end = ser.offset();
                ser.record_segment(name, type_id, start, end);
                Ok(())
            }
            Mode::Unpack => {
                let type_id = TypeId(ser.get_u32()?);
                let mut boxed = ser.registry.resolve(type_id)?.instantiate_boxed();
                boxed.serialize_order(ser)?;
                *self = boxed;
                Ok(())
            }
        }
    }
}

impl Default for Box<dyn Serializable> {
    fn default() -> Self {
        Box::new(NullObject)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
