//! Container codecs.
//!
//! Every container is length-prefixed. Ordered containers preserve
//! element order exactly; unordered containers are written in canonical
//! ascending key order so that re-encoding a decoded graph reproduces a
//! byte-identical stream. Empty containers are a zero length prefix and
//! decode to an empty container.
//!
//! Decoded lengths are untrusted: collections grow as elements actually
//! decode, so a corrupt length prefix hits end-of-stream instead of a
//! giant allocation.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};

use crate::context::{Mode, SerError, Serializer};
use crate::serialize::Serialize;
use crate::wire::FormatError;

impl<T: Serialize + Default> Serialize for Vec<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                for item in self.iter_mut() {
                    item.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut item = T::default();
                    item.serialize(ser)?;
                    self.push(item);
                }
            }
        }
        Ok(())
    }
}

impl<T: Serialize + Default> Serialize for VecDeque<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                for item in self.iter_mut() {
                    item.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut item = T::default();
                    item.serialize(ser)?;
                    self.push_back(item);
                }
            }
        }
        Ok(())
    }
}

impl<T: Serialize + Default, const N: usize> Serialize for [T; N] {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(N)?;
            }
            Mode::Unpack => {
                let at = ser.offset();
                let len = ser.get_len()?;
                if len != N {
                    return Err(FormatError::ArrayLengthMismatch {
                        expected: N as u32,
                        actual: len as u32,
                        offset: at,
                    }
                    .into());
                }
            }
        }
        for item in self.iter_mut() {
            item.serialize(ser)?;
        }
        Ok(())
    }
}

impl<T: Serialize + Default> Serialize for Option<T> {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => match self {
                Some(value) => {
                    ser.put_u8(1)?;
                    value.serialize(ser)
                }
                None => ser.put_u8(0),
            },
            Mode::Unpack => {
                let at = ser.offset();
                match ser.get_u8()? {
                    0 => {
                        *self = None;
                        Ok(())
                    }
                    1 => {
                        let mut value = T::default();
                        value.serialize(ser)?;
                        *self = Some(value);
                        Ok(())
                    }
                    value => Err(FormatError::InvalidPresence { value, offset: at }.into()),
                }
            }
        }
    }
}

impl<K, V> Serialize for BTreeMap<K, V>
where
    K: Serialize + Default + Clone + Ord,
    V: Serialize + Default,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                for (key, value) in self.iter_mut() {
                    // map keys are immutable in place; pack a clone
                    let mut key = key.clone();
                    key.serialize(ser)?;
                    value.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut key = K::default();
                    key.serialize(ser)?;
                    let mut value = V::default();
                    value.serialize(ser)?;
                    self.insert(key, value);
                }
            }
        }
        Ok(())
    }
}

impl<K, V> Serialize for HashMap<K, V>
where
    K: Serialize + Default + Clone + Ord + std::hash::Hash,
    V: Serialize + Default,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                // canonical ascending key order: hash-iteration order of
                // a decoded map differs from its source's, which would
                // break byte-identical re-encoding
                let mut entries: Vec<(&K, &mut V)> = self.iter_mut().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (key, value) in entries {
                    let mut key = key.clone();
                    key.serialize(ser)?;
                    value.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut key = K::default();
                    key.serialize(ser)?;
                    let mut value = V::default();
                    value.serialize(ser)?;
                    self.insert(key, value);
                }
            }
        }
        Ok(())
    }
}

impl<T> Serialize for BTreeSet<T>
where
    T: Serialize + Default + Clone + Ord,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                for item in self.iter() {
                    let mut item = item.clone();
                    item.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut item = T::default();
                    item.serialize(ser)?;
                    self.insert(item);
                }
            }
        }
        Ok(())
    }
}

impl<T> Serialize for HashSet<T>
where
    T: Serialize + Default + Clone + Ord + std::hash::Hash,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                let mut items: Vec<&T> = self.iter().collect();
                items.sort();
                for item in items {
                    let mut item = item.clone();
                    item.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut item = T::default();
                    item.serialize(ser)?;
                    self.insert(item);
                }
            }
        }
        Ok(())
    }
}

impl<T> Serialize for BinaryHeap<T>
where
    T: Serialize + Default + Clone + Ord,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                ser.put_len(self.len())?;
                // heap-internal layout is insertion-dependent and must
                // not leak into the wire; pack in sorted order
                for mut item in self.clone().into_sorted_vec() {
                    item.serialize(ser)?;
                }
            }
            Mode::Unpack => {
                let len = ser.get_len()?;
                self.clear();
                for _ in 0..len {
                    let mut item = T::default();
                    item.serialize(ser)?;
                    self.push(item);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Map-to-records conversion
// ---------------------------------------------------------------------------

/// Explicit map-to-sequence transform. A mapping whose consumer only
/// iterates during the destination phase can be declared as a
/// `RecordStream`: either form packs as a length-prefixed sequence of
/// key/value records, and unpacking always yields [`RecordStream::Records`].
/// Opting in is a field-type choice, never an implicit fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStream<K, V> {
    Map(BTreeMap<K, V>),
    Records(Vec<(K, V)>),
}

impl<K, V> RecordStream<K, V> {
    pub fn len(&self) -> usize {
        match self {
            RecordStream::Map(map) => map.len(),
            RecordStream::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The decoded record list; `None` while still in map form.
    pub fn records(&self) -> Option<&[(K, V)]> {
        match self {
            RecordStream::Map(_) => None,
            RecordStream::Records(records) => Some(records),
        }
    }
}

impl<K, V> Default for RecordStream<K, V> {
    fn default() -> Self {
        RecordStream::Records(Vec::new())
    }
}

impl<K, V> Serialize for RecordStream<K, V>
where
    K: Serialize + Default + Clone + Ord,
    V: Serialize + Default,
{
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => match self {
                RecordStream::Map(map) => {
                    ser.put_len(map.len())?;
                    for (key, value) in map.iter_mut() {
                        let mut key = key.clone();
                        key.serialize(ser)?;
                        value.serialize(ser)?;
                    }
                    Ok(())
                }
                RecordStream::Records(records) => {
                    ser.put_len(records.len())?;
                    for (key, value) in records.iter_mut() {
                        key.serialize(ser)?;
                        value.serialize(ser)?;
                    }
                    Ok(())
                }
            },
            Mode::Unpack => {
                let len = ser.get_len()?;
                let mut records = Vec::new();
                for _ in 0..len {
                    let mut key = K::default();
                    key.serialize(ser)?;
                    let mut value = V::default();
                    value.serialize(ser)?;
                    records.push((key, value));
                }
                *self = RecordStream::Records(records);
                Ok(())
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
