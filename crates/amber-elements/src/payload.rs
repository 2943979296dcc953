//! Event payload variants.

use amber_core::context::{Mode, SerError, Serializer};
use amber_core::serialize::Serialize;

/// What a pulse carries. A closed set: decoding validates the tag and
/// rejects anything outside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// Bare pulse, no data.
    #[default]
    Empty,
    /// A single machine word.
    Word(u32),
    /// Opaque bytes.
    Blob(Vec<u8>),
    /// Key/value pair, the smallest structured form.
    Pair { key: String, value: i64 },
}

impl Payload {
    fn tag(&self) -> u32 {
        match self {
            Payload::Empty => 0,
            Payload::Word(_) => 1,
            Payload::Blob(_) => 2,
            Payload::Pair { .. } => 3,
        }
    }
}

impl Serialize for Payload {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match ser.mode() {
            Mode::Pack => {
                let mut tag = self.tag();
                tag.serialize(ser)?;
                match self {
                    Payload::Empty => Ok(()),
                    Payload::Word(word) => word.serialize(ser),
                    Payload::Blob(bytes) => bytes.serialize(ser),
                    Payload::Pair { key, value } => {
                        key.serialize(ser)?;
                        value.serialize(ser)
                    }
                }
            }
            Mode::Unpack => {
                let mut tag = 0u32;
                tag.serialize(ser)?;
                *self = match tag {
                    0 => Payload::Empty,
                    1 => {
                        let mut word = 0u32;
                        word.serialize(ser)?;
                        Payload::Word(word)
                    }
                    2 => {
                        let mut bytes = Vec::new();
                        bytes.serialize(ser)?;
                        Payload::Blob(bytes)
                    }
                    3 => {
                        let mut key = String::new();
                        key.serialize(ser)?;
                        let mut value = 0i64;
                        value.serialize(ser)?;
                        Payload::Pair { key, value }
                    }
                    tag => return Err(ser.invalid_tag(tag, "Payload")),
                };
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_core::registry::TypeRegistryBuilder;
    use amber_core::wire::FormatError;
    use std::sync::Arc;

    fn round_trip(payload: &Payload) -> Payload {
        let reg = Arc::new(TypeRegistryBuilder::new().build().unwrap());
        let mut ser = Serializer::packing(Arc::clone(&reg));
        let mut original = payload.clone();
        ser.root(&mut original).unwrap();
        let bytes = ser.finish().unwrap();
        let mut ser = Serializer::unpacking(reg, &bytes);
        let mut out = Payload::default();
        ser.root(&mut out).unwrap();
        ser.expect_end().unwrap();
        out
    }

    #[test]
    fn every_alternative_round_trips() {
        for payload in [
            Payload::Empty,
            Payload::Word(0xFFFF_0001),
            Payload::Blob(vec![1, 2, 3]),
            Payload::Blob(vec![]),
            Payload::Pair {
                key: String::from("temp"),
                value: -40,
            },
        ] {
            assert_eq!(round_trip(&payload), payload);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let reg = Arc::new(TypeRegistryBuilder::new().build().unwrap());
        let mut ser = Serializer::packing(Arc::clone(&reg));
        let mut tag = 42u32;
        ser.root(&mut tag).unwrap();
        let bytes = ser.finish().unwrap();

        let mut ser = Serializer::unpacking(reg, &bytes);
        let mut out = Payload::default();
        let err = ser.root(&mut out).unwrap_err();
        assert_eq!(
            err,
            SerError::Format(FormatError::InvalidVariantTag {
                tag: 42,
                type_name: "Payload",
                offset: 0,
            })
        );
    }
}
