//! The serialization context.
//!
//! A [`Serializer`] drives exactly one pack or unpack pass over an object
//! graph. Its mode is fixed at construction and it owns one object table
//! for its entire lifetime, so identity tokens assigned during the pass
//! stay consistent until the caller closes or resets the context.
//!
//! A failed pass has no partial recovery: the caller discards the context
//! and retries with a fresh one.

use std::sync::Arc;

use crate::id::{ObjectId, TypeId};
use crate::registry::{RegistryError, TypeRegistry};
#[cfg(feature = "schema")]
use crate::schema::SchemaRecorder;
use crate::serialize::Serialize;
use crate::track::ObjectTable;
use crate::wire::{FormatError, WireReader, WireWriter};

/// Errors raised while driving a pack or unpack pass. All of them are
/// unrecoverable within the pass.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("dangling reference: {id} was never defined in the stream")]
    DanglingReference { id: ObjectId },
    #[error("operation on a closed serialization context")]
    ContextClosed,
    #[error("operation requires a {expected:?}-mode context, this one is {actual:?}")]
    WrongMode { expected: Mode, actual: Mode },
}

/// Whether a context encodes or decodes. Set at construction, immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Pack,
    Unpack,
}

pub(crate) enum Driver<'buf> {
    Pack(WireWriter),
    Unpack(WireReader<'buf>),
}

/// Top-level driver for one serialization pass.
pub struct Serializer<'buf> {
    pub(crate) driver: Driver<'buf>,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) table: ObjectTable,
    closed: bool,
    #[cfg(feature = "schema")]
    pub(crate) schema: Option<SchemaRecorder>,
}

impl Serializer<'_> {
    /// Open a packing context. Bytes accumulate internally until
    /// [`Serializer::finish`] hands them to the caller.
    pub fn packing(registry: Arc<TypeRegistry>) -> Serializer<'static> {
        Serializer {
            driver: Driver::Pack(WireWriter::new()),
            registry,
            table: ObjectTable::new(),
            closed: false,
            #[cfg(feature = "schema")]
            schema: None,
        }
    }

    /// Open an unpacking context over an in-memory stream.
    pub fn unpacking(registry: Arc<TypeRegistry>, bytes: &[u8]) -> Serializer<'_> {
        Serializer {
            driver: Driver::Unpack(WireReader::new(bytes)),
            registry,
            table: ObjectTable::new(),
            closed: false,
            #[cfg(feature = "schema")]
            schema: None,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.driver {
            Driver::Pack(_) => Mode::Pack,
            Driver::Unpack(_) => Mode::Unpack,
        }
    }

    /// The registry this context resolves polymorphic types against.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Current byte offset: bytes written so far when packing, bytes
    /// consumed so far when unpacking.
    pub fn offset(&self) -> usize {
        match &self.driver {
            Driver::Pack(w) => w.offset(),
            Driver::Unpack(r) => r.offset(),
        }
    }

    fn ensure_open(&self) -> Result<(), SerError> {
        if self.closed {
            return Err(SerError::ContextClosed);
        }
        Ok(())
    }

    /// The single entry point: serialize one root value in the context's
    /// mode. May be called for several roots of the same graph; identity
    /// tokens are shared across all of them.
    ///
    /// A failed pass closes the context: a half-driven object table is
    /// unsafe to keep using, so the caller discards the context and
    /// retries the whole pass with a fresh one.
    pub fn root<T: Serialize + ?Sized>(&mut self, value: &mut T) -> Result<(), SerError> {
        self.ensure_open()?;
        let result = value.serialize(self);
        if result.is_err() {
            self.closed = true;
        }
        result
    }

    /// Clear the object table so the context can be reused for an
    /// independent graph. Without a reset, identities from the previous
    /// graph would leak into the next one.
    pub fn reset(&mut self) -> Result<(), SerError> {
        self.ensure_open()?;
        self.table.clear();
        Ok(())
    }

    /// Close a packing context and take the encoded bytes.
    pub fn finish(&mut self) -> Result<Vec<u8>, SerError> {
        self.ensure_open()?;
        match &mut self.driver {
            Driver::Pack(w) => {
                let bytes = w.take_bytes();
                self.closed = true;
                Ok(bytes)
            }
            Driver::Unpack(_) => Err(SerError::WrongMode {
                expected: Mode::Pack,
                actual: Mode::Unpack,
            }),
        }
    }

    /// Fail unless an unpacking context has consumed its whole stream.
    pub fn expect_end(&mut self) -> Result<(), SerError> {
        self.ensure_open()?;
        match &self.driver {
            Driver::Unpack(r) => Ok(r.expect_end()?),
            Driver::Pack(_) => Err(SerError::WrongMode {
                expected: Mode::Unpack,
                actual: Mode::Pack,
            }),
        }
    }

    /// Move the context to its terminal state. Every further operation
    /// fails with [`SerError::ContextClosed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Build the error for a variant tag outside the closed alternative
    /// set, pointing at the tag's own offset.
    pub fn invalid_tag(&self, tag: u32, type_name: &'static str) -> SerError {
        SerError::Format(FormatError::InvalidVariantTag {
            tag,
            type_name,
            offset: self.offset().saturating_sub(4),
        })
    }

    // -- byte plumbing used by the codec impls --

    pub(crate) fn put_u8(&mut self, v: u8) -> Result<(), SerError> {
        match &mut self.driver {
            Driver::Pack(w) => {
                w.write_u8(v);
                Ok(())
            }
            Driver::Unpack(_) => Err(SerError::WrongMode {
                expected: Mode::Pack,
                actual: Mode::Unpack,
            }),
        }
    }

    pub(crate) fn get_u8(&mut self) -> Result<u8, SerError> {
        match &mut self.driver {
            Driver::Unpack(r) => Ok(r.read_u8()?),
            Driver::Pack(_) => Err(SerError::WrongMode {
                expected: Mode::Unpack,
                actual: Mode::Pack,
            }),
        }
    }

    pub(crate) fn put_u32(&mut self, v: u32) -> Result<(), SerError> {
        match &mut self.driver {
            Driver::Pack(w) => {
                w.write_u32(v);
                Ok(())
            }
            Driver::Unpack(_) => Err(SerError::WrongMode {
                expected: Mode::Pack,
                actual: Mode::Unpack,
            }),
        }
    }

    pub(crate) fn get_u32(&mut self) -> Result<u32, SerError> {
        match &mut self.driver {
            Driver::Unpack(r) => Ok(r.read_u32()?),
            Driver::Pack(_) => Err(SerError::WrongMode {
                expected: Mode::Unpack,
                actual: Mode::Pack,
            }),
        }
    }

    pub(crate) fn put_u64(&mut self, v: u64) -> Result<(), SerError> {
        match &mut self.driver {
            Driver::Pack(w) => {
                w.write_u64(v);
                Ok(())
            }
            Driver::Unpack(_) => Err(SerError::WrongMode {
                expected: Mode::Pack,
                actual: Mode::Unpack,
            }),
        }
    }

    pub(crate) fn get_u64(&mut self) -> Result<u64, SerError> {
        match &mut self.driver {
            Driver::Unpack(r) => Ok(r.read_u64()?),
            Driver::Pack(_) => Err(SerError::WrongMode {
                expected: Mode::Unpack,
                actual: Mode::Pack,
            }),
        }
    }

    pub(crate) fn put_len(&mut self, len: usize) -> Result<(), SerError> {
        match &mut self.driver {
            Driver::Pack(w) => Ok(w.write_len(len)?),
            Driver::Unpack(_) => Err(SerError::WrongMode {
                expected: Mode::Pack,
                actual: Mode::Unpack,
            }),
        }
    }

    pub(crate) fn get_len(&mut self) -> Result<usize, SerError> {
        match &mut self.driver {
            Driver::Unpack(r) => Ok(r.read_len()?),
            Driver::Pack(_) => Err(SerError::WrongMode {
                expected: Mode::Unpack,
                actual: Mode::Pack,
            }),
        }
    }

    // -- schema recording --

    /// Attach a schema recorder to a packing context. Observational
    /// only: the wire bytes are identical with or without it.
    #[cfg(feature = "schema")]
    pub fn enable_schema(&mut self) {
        self.schema = Some(SchemaRecorder::new(&self.registry));
    }

    #[cfg(feature = "schema")]
    pub fn schema(&self) -> Option<&SchemaRecorder> {
        self.schema.as_ref()
    }

    #[cfg(feature = "schema")]
    pub fn take_schema(&mut self) -> Option<SchemaRecorder> {
        self.schema.take()
    }

    #[allow(unused_variables)]
    pub(crate) fn record_segment(
        &mut self,
        name: &'static str,
        type_id: TypeId,
        start: usize,
        end: usize,
    ) {
        #[cfg(feature = "schema")]
        if let Some(schema) = &mut self.schema {
            schema.record_segment(name, type_id, start, end);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
