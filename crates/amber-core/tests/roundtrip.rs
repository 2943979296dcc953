//! Round-trip tests over realistic field mixes: containers, optionals,
//! variants, and registered object types.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use amber_core::context::{Mode, SerError, Serializer};
use amber_core::serialize::Serialize;
use amber_core::test_utils::{round_trip, test_registry, Leaf};
use amber_core::wire::FormatError;

// ---------------------------------------------------------------------------
// A closed variant type, the way engine consumers write them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Signal {
    #[default]
    Idle,
    Level(u32),
    Burst {
        count: u32,
        gap: u16,
    },
}

impl Serialize for Signal {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                let mut tag: u32 = match self {
                    Signal::Idle => 0,
                    Signal::Level(_) => 1,
                    Signal::Burst { .. } => 2,
                };
                tag.serialize(ser)?;
                match self {
                    Signal::Idle => Ok(()),
                    Signal::Level(level) => level.serialize(ser),
                    Signal::Burst { count, gap } => {
                        count.serialize(ser)?;
                        gap.serialize(ser)
                    }
                }
            }
            Mode::Unpack => {
                let mut tag = 0u32;
                tag.serialize(ser)?;
                *self = match tag {
                    0 => Signal::Idle,
                    1 => {
                        let mut level = 0u32;
                        level.serialize(ser)?;
                        Signal::Level(level)
                    }
                    2 => {
                        let mut count = 0u32;
                        count.serialize(ser)?;
                        let mut gap = 0u16;
                        gap.serialize(ser)?;
                        Signal::Burst { count, gap }
                    }
                    tag => return Err(ser.invalid_tag(tag, "Signal")),
                };
                Ok(())
            }
        }
    }
}

#[test]
fn every_variant_alternative_round_trips() {
    let reg = test_registry();
    for signal in [
        Signal::Idle,
        Signal::Level(900),
        Signal::Burst { count: 4, gap: 7 },
    ] {
        let mut original = signal.clone();
        assert_eq!(round_trip(&reg, &mut original), signal);
    }
}

#[test]
fn unknown_variant_tag_fails_with_offset() {
    let reg = test_registry();
    let mut ser = Serializer::packing(Arc::clone(&reg));
    let mut bogus = 9u32;
    ser.root(&mut bogus).unwrap();
    let bytes = ser.finish().unwrap();

    let mut ser = Serializer::unpacking(reg, &bytes);
    let mut signal = Signal::Idle;
    let err = ser.root(&mut signal).unwrap_err();
    assert_eq!(
        err,
        SerError::Format(FormatError::InvalidVariantTag {
            tag: 9,
            type_name: "Signal",
            offset: 0,
        })
    );
}

// ---------------------------------------------------------------------------
// Mixed structures
// ---------------------------------------------------------------------------

#[test]
fn struct_with_every_field_kind_round_trips() {
    #[derive(Debug, Default, PartialEq)]
    struct Mixed {
        id: u64,
        tag: String,
        lanes: [u8; 3],
        history: VecDeque<i64>,
        routes: BTreeMap<String, u32>,
        load: HashMap<u32, u64>,
        pending: Option<Signal>,
        leaf: Leaf,
    }

    impl Serialize for Mixed {
        fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
            self.id.serialize(ser)?;
            self.tag.serialize(ser)?;
            self.lanes.serialize(ser)?;
            self.history.serialize(ser)?;
            self.routes.serialize(ser)?;
            self.load.serialize(ser)?;
            self.pending.serialize(ser)?;
            self.leaf.serialize(ser)
        }
    }

    let reg = test_registry();
    let mut original = Mixed {
        id: 77,
        tag: String::from("relay"),
        lanes: [1, 2, 3],
        history: VecDeque::from([-5, 0, 5]),
        routes: BTreeMap::from([(String::from("east"), 2), (String::from("west"), 9)]),
        load: HashMap::from([(1, 100), (2, 200)]),
        pending: Some(Signal::Level(3)),
        leaf: Leaf {
            label: String::from("stats"),
            value: 12,
        },
    };

    let mut ser = Serializer::packing(Arc::clone(&reg));
    ser.root(&mut original).unwrap();
    let first = ser.finish().unwrap();

    let mut ser = Serializer::unpacking(Arc::clone(&reg), &first);
    let mut decoded = Mixed::default();
    ser.root(&mut decoded).unwrap();
    ser.expect_end().unwrap();
    assert_eq!(decoded, original);

    // idempotent re-encoding
    let mut ser = Serializer::packing(reg);
    ser.root(&mut decoded).unwrap();
    assert_eq!(ser.finish().unwrap(), first);
}

#[test]
fn ordered_sequence_is_not_sorted_by_the_codec() {
    let reg = test_registry();
    let mut v = vec![3u32, 1, 2];
    assert_eq!(round_trip(&reg, &mut v), vec![3, 1, 2]);
}

#[test]
fn deeply_nested_optionals_round_trip() {
    let reg = test_registry();
    let mut value: Option<Option<Vec<Option<u8>>>> =
        Some(Some(vec![Some(1), None, Some(3)]));
    let decoded = round_trip(&reg, &mut value);
    assert_eq!(decoded, Some(Some(vec![Some(1), None, Some(3)])));
}

#[test]
fn context_reset_separates_independent_graphs() {
    let reg = test_registry();
    let shared = amber_core::shared::Shared::new(Leaf {
        label: String::from("s"),
        value: 1,
    });

    // two independent passes over the same graph, one context, explicit
    // reset between them: both encodings stand alone
    let mut ser = Serializer::packing(Arc::clone(&reg));
    let mut first_handle = shared.clone();
    ser.root(&mut first_handle).unwrap();
    let split = ser.offset();
    ser.reset().unwrap();
    let mut second_handle = shared;
    ser.root(&mut second_handle).unwrap();
    let bytes = ser.finish().unwrap();

    let (first, second) = bytes.split_at(split);
    assert_eq!(first, second, "after reset the object is re-encoded in full");

    // without the reset the second occurrence would have been a
    // back-reference token only
    assert!(second.len() > 8);
}
