//! Checkpointable component types.
//!
//! Components form the pointer-connected part of a simulation graph:
//! relays link forward through shared references and backward through
//! weak ones (cycles included), hubs hold polymorphic member lists.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::AtomicU64;

use amber_core::containers::RecordStream;
use amber_core::context::{SerError, Serializer};
use amber_core::id::TypeId;
use amber_core::registry::{FieldDescriptor, FieldKind};
use amber_core::serialize::Serialize;
use amber_core::shared::{Serializable, Shared, WeakRef};

use crate::event::{PulseEvent, SimTime};
use crate::stats::Accumulator;

pub const OSCILLATOR_TYPE: TypeId = TypeId(12);
pub const RELAY_TYPE: TypeId = TypeId(13);
pub const HUB_TYPE: TypeId = TypeId(14);

// ---------------------------------------------------------------------------
// Oscillator
// ---------------------------------------------------------------------------

/// A periodic pulse source. The fired counter is atomic because the
/// reporting path reads it from outside the simulation thread between
/// passes.
#[derive(Debug, Default)]
pub struct Oscillator {
    pub name: String,
    pub period: SimTime,
    pub fired: AtomicU64,
    pub last: Option<PulseEvent>,
    pub jitter: Accumulator,
}

pub const OSCILLATOR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "name",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "period",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "fired",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "last",
        kind: FieldKind::OwnedValue,
    },
    FieldDescriptor {
        name: "jitter",
        kind: FieldKind::OwnedValue,
    },
];

impl Serializable for Oscillator {
    fn type_id(&self) -> TypeId {
        OSCILLATOR_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.name.serialize(ser)?;
        self.period.serialize(ser)?;
        self.fired.serialize(ser)?;
        self.last.serialize(ser)?;
        self.jitter.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// Forwards pulses downstream. Holds its queue of undelivered events, a
/// shared link to the next relay, and a weak back-link to whoever feeds
/// it.
#[derive(Debug, Default)]
pub struct Relay {
    pub name: String,
    pub downstream: Option<Shared<Relay>>,
    pub upstream: WeakRef<Relay>,
    pub queue: VecDeque<PulseEvent>,
    pub stats: Accumulator,
}

pub const RELAY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "name",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "downstream",
        kind: FieldKind::SharedPointer,
    },
    FieldDescriptor {
        name: "upstream",
        kind: FieldKind::WeakReference,
    },
    FieldDescriptor {
        name: "queue",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "stats",
        kind: FieldKind::OwnedValue,
    },
];

impl Serializable for Relay {
    fn type_id(&self) -> TypeId {
        RELAY_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.name.serialize(ser)?;
        self.downstream.serialize(ser)?;
        self.upstream.serialize(ser)?;
        self.queue.serialize(ser)?;
        self.stats.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Build a relay pipeline: forward shared links, weak back-links, and
/// optionally a closing link from tail to head.
pub fn relay_pipeline(names: &[&str], closed: bool) -> Vec<Shared<Relay>> {
    let relays: Vec<Shared<Relay>> = names
        .iter()
        .map(|name| {
            Shared::new(Relay {
                name: String::from(*name),
                ..Relay::default()
            })
        })
        .collect();
    for i in 0..relays.len().saturating_sub(1) {
        relays[i].borrow_mut().downstream = Some(relays[i + 1].clone());
        relays[i + 1].borrow_mut().upstream = relays[i].downgrade();
    }
    if closed && relays.len() > 1 {
        let head = relays[0].clone();
        let last = relays.len() - 1;
        relays[last].borrow_mut().downstream = Some(head);
        relays[0].borrow_mut().upstream = relays[last].downgrade();
    }
    relays
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// A junction holding polymorphic members and routing state: an ordered
/// route table, an unordered load table, and an archived route list kept
/// only for iteration.
#[derive(Debug, Default)]
pub struct Hub {
    pub name: String,
    pub members: Vec<Shared<dyn Serializable>>,
    pub routes: BTreeMap<String, u32>,
    pub load: HashMap<u32, u64>,
    pub archive: RecordStream<u32, u64>,
}

pub const HUB_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "name",
        kind: FieldKind::Primitive,
    },
    FieldDescriptor {
        name: "members",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "routes",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "load",
        kind: FieldKind::Container,
    },
    FieldDescriptor {
        name: "archive",
        kind: FieldKind::Container,
    },
];

impl Serializable for Hub {
    fn type_id(&self) -> TypeId {
        HUB_TYPE
    }
    fn serialize_order(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.name.serialize(ser)?;
        self.members.serialize(ser)?;
        self.routes.serialize(ser)?;
        self.load.serialize(ser)?;
        self.archive.serialize(ser)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
