//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available everywhere test code runs (benchmarks enable
//! the `test-utils` feature).

use std::any::Any;
use std::sync::Arc;

use crate::context::{SerError, Serializer};
use crate::id::TypeId;
use crate::registry::{FieldDescriptor, FieldKind, TypeRegistry, TypeRegistryBuilder};
use crate::serialize::Serialize;
use crate::shared::{Serializable, Shared, WeakRef};

pub const LEAF_TYPE: TypeId = TypeId(1);
pub const NODE_TYPE: TypeId = TypeId(2);

// ===========================================================================
// Leaf: the smallest registrable type
// ===========================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub label: String,
    pub value: u64,
}

pub const LEAF_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "label",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "value",
        kind: FieldKind::Primitive,
    },
];

impl Serializable for Leaf {
    fn type_id(&self) -> TypeId {
        LEAF_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.label.serialize(ser)?;
        self.value.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Leaf doubles as a plain owned field in test structures.
impl Serialize for Leaf {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.serialize_order(ser)
    }
}

// ===========================================================================
// Node: links, back-references, and a polymorphic payload
// ===========================================================================

#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub next: Option<Shared<Node>>,
    pub parent: WeakRef<Node>,
    pub payload: Option<Shared<dyn Serializable>>,
    pub weights: Vec<i32>,
}

pub const NODE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "name",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "next",
        kind: FieldKind::SharedPointer,
    },
    FieldDescriptor {
        name: "parent",
        kind: FieldKind::WeakReference,
    },
    FieldDescriptor {
        name: "payload",
        kind: FieldKind::SharedPointer,
    },
    FieldDescriptor {
        name: "weights",
        kind: FieldKind::Container,
    },
];

impl Serializable for Node {
    fn type_id(&self) -> TypeId {
        NODE_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.name.serialize(ser)?;
        self.next.serialize(ser)?;
        self.parent.serialize(ser)?;
        self.payload.serialize(ser)?;
        self.weights.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Registry and graph builders
// ===========================================================================

/// Registry containing the helper types above.
pub fn test_registry() -> Arc<TypeRegistry> {
    let mut builder = TypeRegistryBuilder::new();
    builder.register::<Leaf>(LEAF_TYPE, "leaf", LEAF_FIELDS).unwrap();
    builder.register::<Node>(NODE_TYPE, "node", NODE_FIELDS).unwrap();
    Arc::new(builder.build().unwrap())
}

/// A chain of `len` nodes linked forward through `next` and backward
/// through weak `parent` references. Returns every node, head first.
pub fn linked_chain(len: usize) -> Vec<Shared<Node>> {
    let nodes: Vec<Shared<Node>> = (0..len)
        .map(|i| {
            Shared::new(Node {
                name: format!("node-{i}"),
                weights: vec![i as i32, (i as i32) * 2],
                ..Node::default()
            })
        })
        .collect();
    for i in 0..len.saturating_sub(1) {
        nodes[i].borrow_mut().next = Some(nodes[i + 1].clone());
        nodes[i + 1].borrow_mut().parent = nodes[i].downgrade();
    }
    nodes
}

/// A `len`-node cycle: a linked chain whose tail points back to its
/// head. Break the cycle (`nodes[last].next = None`) when the graph
/// should be reclaimed.
pub fn ring(len: usize) -> Vec<Shared<Node>> {
    let nodes = linked_chain(len);
    if len > 1 {
        let head = nodes[0].clone();
        nodes[len - 1].borrow_mut().next = Some(head);
        nodes[0].borrow_mut().parent = nodes[len - 1].downgrade();
    }
    nodes
}

/// Round-trip a value through a fresh pack and unpack pass.
pub fn round_trip<T: Serialize + Default>(
    registry: &Arc<TypeRegistry>,
    value: &mut T,
) -> T {
    let mut ser = Serializer::packing(Arc::clone(registry));
    ser.root(value).unwrap();
    let bytes = ser.finish().unwrap();
    let mut ser = Serializer::unpacking(Arc::clone(registry), &bytes);
    let mut out = T::default();
    ser.root(&mut out).unwrap();
    ser.expect_end().unwrap();
    out
}
