//! Atomic value codecs.
//!
//! Packing loads with `Acquire`, unpacking stores with `Release`, so a
//! value published by another thread before the pass is observed
//! consistently. The wire does not capture values written concurrently
//! *during* an encode call; callers must not mutate an object graph
//! mid-serialization.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};

use crate::context::{Driver, SerError, Serializer};
use crate::serialize::Serialize;

macro_rules! impl_atomic_serialize {
    ($ty:ty, $write:ident, $read:ident) => {
        impl Serialize for $ty {
            fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
                match &mut ser.driver {
                    Driver::Pack(w) => {
                        w.$write(self.load(Ordering::Acquire));
                        Ok(())
                    }
                    Driver::Unpack(r) => {
                        self.store(r.$read()?, Ordering::Release);
                        Ok(())
                    }
                }
            }
        }
    };
}

impl_atomic_serialize!(AtomicU32, write_u32, read_u32);
impl_atomic_serialize!(AtomicU64, write_u64, read_u64);
impl_atomic_serialize!(AtomicI32, write_i32, read_i32);
impl_atomic_serialize!(AtomicI64, write_i64, read_i64);
impl_atomic_serialize!(AtomicBool, write_bool, read_bool);
