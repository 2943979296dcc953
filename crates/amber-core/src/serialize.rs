//! The field-level serialization trait and scalar codecs.
//!
//! [`Serialize`] is a single, mode-symmetric ordering function: in pack
//! mode it reads the value into the stream, in unpack mode it populates
//! the value from the stream. Because both directions run the same code,
//! fields are always decoded in the exact order they were encoded.
//!
//! Container decoding constructs elements with `Default` before
//! populating them, which is why the container impls carry a `Default`
//! bound on their element types.

use crate::context::{Driver, SerError, Serializer};

/// A value that can participate in a serialization pass.
pub trait Serialize {
    /// Encode or decode `self` depending on the context's mode.
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError>;
}

macro_rules! impl_scalar_serialize {
    ($ty:ty, $write:ident, $read:ident) => {
        impl Serialize for $ty {
            fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
                match &mut ser.driver {
                    Driver::Pack(w) => {
                        w.$write(*self);
                        Ok(())
                    }
                    Driver::Unpack(r) => {
                        *self = r.$read()?;
                        Ok(())
                    }
                }
            }
        }
    };
}

impl_scalar_serialize!(u8, write_u8, read_u8);
impl_scalar_serialize!(u16, write_u16, read_u16);
impl_scalar_serialize!(u32, write_u32, read_u32);
impl_scalar_serialize!(u64, write_u64, read_u64);
impl_scalar_serialize!(i8, write_i8, read_i8);
impl_scalar_serialize!(i16, write_i16, read_i16);
impl_scalar_serialize!(i32, write_i32, read_i32);
impl_scalar_serialize!(i64, write_i64, read_i64);
impl_scalar_serialize!(f32, write_f32, read_f32);
impl_scalar_serialize!(f64, write_f64, read_f64);
impl_scalar_serialize!(bool, write_bool, read_bool);

impl Serialize for String {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        match &mut ser.driver {
            Driver::Pack(w) => Ok(w.write_str(self)?),
            Driver::Unpack(r) => {
                *self = r.read_str()?;
                Ok(())
            }
        }
    }
}

impl<A: Serialize, B: Serialize> Serialize for (A, B) {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.0.serialize(ser)?;
        self.1.serialize(ser)
    }
}

impl<A: Serialize, B: Serialize, C: Serialize> Serialize for (A, B, C) {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.0.serialize(ser)?;
        self.1.serialize(ser)?;
        self.2.serialize(ser)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
