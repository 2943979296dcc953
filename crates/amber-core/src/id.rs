use std::fmt;

/// Identifies a registered serializable type. Assigned at registration
/// time and stable across process restarts. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Reserved identifier for the internal placeholder object.
    /// Never registrable; packing an object that reports it fails.
    pub const NULL: TypeId = TypeId(0);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.0)
    }
}

/// Identity token assigned to a shared object the first time it is
/// visited during one context pass. Sequential, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Reserved sentinel for an absent reference. Never allocates.
    pub const NULL: ObjectId = ObjectId(0);

    /// Whether this is the reserved null sentinel.
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object #{}", self.0)
    }
}
