//! Checkpointable event types.

use std::any::Any;
use std::collections::{BTreeSet, VecDeque};

use amber_core::context::{SerError, Serializer};
use amber_core::id::TypeId;
use amber_core::registry::{FieldDescriptor, FieldKind};
use amber_core::serialize::Serialize;
use amber_core::shared::Serializable;

use crate::payload::Payload;

pub const PULSE_EVENT_TYPE: TypeId = TypeId(10);
pub const BURST_EVENT_TYPE: TypeId = TypeId(11);

/// Simulation time in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(pub u64);

impl Serialize for SimTime {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.0.serialize(ser)
    }
}

// ---------------------------------------------------------------------------
// PulseEvent
// ---------------------------------------------------------------------------

/// The basic unit of traffic between components: a sequence number, a
/// delivery time, and a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseEvent {
    pub seq: u64,
    pub time: SimTime,
    pub payload: Payload,
}

pub const PULSE_EVENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "seq",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "time",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "payload",
        kind: FieldKind::OwnedValue,
    },
];

impl Serializable for PulseEvent {
    fn type_id(&self) -> TypeId {
        PULSE_EVENT_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.seq.serialize(ser)?;
        self.time.serialize(ser)?;
        self.payload.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// PulseEvent also appears as a plain owned field (e.g. queued inside a
// component), where the container codecs drive it through Serialize.
impl Serialize for PulseEvent {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.serialize_order(ser)
    }
}

// ---------------------------------------------------------------------------
// BurstEvent
// ---------------------------------------------------------------------------

/// A batched event: a fixed delivery window plus the backlog of times
/// and the set of source components that contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BurstEvent {
    pub window: [u32; 4],
    pub backlog: VecDeque<SimTime>,
    pub sources: BTreeSet<u32>,
}

pub const BURST_EVENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "window",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "backlog",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "sources",
        kind: FieldKind::Container,
    },
];

impl Serializable for BurstEvent {
    fn type_id(&self) -> TypeId {
        BURST_EVENT_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.window.serialize(ser)?;
        self.backlog.serialize(ser)?;
        self.sources.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Serialize for BurstEvent {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.serialize_order(ser)
    }
}
