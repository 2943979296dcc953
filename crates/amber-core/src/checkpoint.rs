//! Checkpoint envelope: versioned headers around one or more serialized
//! root sets.
//!
//! A single checkpoint drives the whole root set through one context, so
//! objects shared between roots keep one identity. The partitioned form
//! packs each partition through its own independent context, so
//! partitions are decodable in isolation and may be produced by
//! independent ranks.

use std::sync::Arc;

use crate::context::{SerError, Serializer};
use crate::migration::{MigrationError, MigrationRegistry};
use crate::registry::TypeRegistry;
use crate::serialize::Serialize;
use crate::shared::{Serializable, Shared};
use crate::wire::{FormatError, WireReader};

/// Magic number identifying a single-stream checkpoint.
pub const CHECKPOINT_MAGIC: u32 = 0xA3B3_0001;

/// Magic number identifying a partitioned checkpoint.
pub const PARTITIONED_MAGIC: u32 = 0xA3B3_0002;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised by the checkpoint envelope.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("invalid magic number: expected {expected:#010x}, got {found:#010x}")]
    InvalidMagic { expected: u32, found: u32 },
    #[error("unsupported format version: expected {FORMAT_VERSION}, got {0}")]
    UnsupportedVersion(u32),
    #[error("checkpoint from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error(transparent)]
    Ser(#[from] SerError),
    #[error("partition {index} failed: {source}")]
    Partition { index: usize, source: SerError },
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),
}

/// Header prepended to every checkpoint stream. Validated before any
/// payload decoding is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckpointHeader {
    pub magic: u32,
    pub version: u32,
    /// Simulation tick at which the checkpoint was taken.
    pub tick: u64,
    /// Number of root objects (single form) or partitions (partitioned
    /// form) that follow.
    pub count: u32,
}

impl CheckpointHeader {
    fn new(magic: u32, tick: u64, count: u32) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            tick,
            count,
        }
    }

    fn validate(&self, expected_magic: u32) -> Result<(), CheckpointError> {
        if self.magic != expected_magic {
            return Err(CheckpointError::InvalidMagic {
                expected: expected_magic,
                found: self.magic,
            });
        }
        if self.version > FORMAT_VERSION {
            return Err(CheckpointError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Serialize for CheckpointHeader {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.magic.serialize(ser)?;
        self.version.serialize(ser)?;
        self.tick.serialize(ser)?;
        self.count.serialize(ser)
    }
}

fn count_of(len: usize) -> Result<u32, SerError> {
    u32::try_from(len).map_err(|_| SerError::Format(FormatError::LengthOverflow { len }))
}

// ---------------------------------------------------------------------------
// Single-stream checkpoints
// ---------------------------------------------------------------------------

/// A restored single-stream checkpoint.
#[derive(Debug)]
pub struct Checkpoint {
    pub tick: u64,
    pub roots: Vec<Shared<dyn Serializable>>,
}

/// Serialize a root set into a checkpoint stream. All roots share one
/// context, so cross-root references collapse to back-references.
pub fn write_checkpoint(
    registry: &Arc<TypeRegistry>,
    tick: u64,
    roots: &mut [Shared<dyn Serializable>],
) -> Result<Vec<u8>, CheckpointError> {
    let mut ser = Serializer::packing(Arc::clone(registry));
    let mut header = CheckpointHeader::new(CHECKPOINT_MAGIC, tick, count_of(roots.len())?);
    ser.root(&mut header)?;
    for root in roots.iter_mut() {
        ser.root(root)?;
    }
    Ok(ser.finish()?)
}

/// Reconstruct a root set from a checkpoint stream.
pub fn read_checkpoint(
    registry: &Arc<TypeRegistry>,
    data: &[u8],
) -> Result<Checkpoint, CheckpointError> {
    let mut ser = Serializer::unpacking(Arc::clone(registry), data);
    let mut header = CheckpointHeader::default();
    ser.root(&mut header)?;
    header.validate(CHECKPOINT_MAGIC)?;

    let mut roots = Vec::new();
    for _ in 0..header.count {
        let mut root = Shared::<dyn Serializable>::default();
        ser.root(&mut root)?;
        roots.push(root);
    }
    ser.expect_end()?;
    Ok(Checkpoint {
        tick: header.tick,
        roots,
    })
}

/// Like [`read_checkpoint`], but when the stream is from an older format
/// version, applies registered migrations and retries.
pub fn read_checkpoint_with_migrations(
    registry: &Arc<TypeRegistry>,
    data: &[u8],
    migrations: &MigrationRegistry,
) -> Result<Checkpoint, CheckpointError> {
    match read_checkpoint(registry, data) {
        Err(CheckpointError::UnsupportedVersion(old)) => {
            let migrated = migrations.apply(data, old, FORMAT_VERSION)?;
            read_checkpoint(registry, &migrated)
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Partitioned checkpoints
// ---------------------------------------------------------------------------

/// A restored partitioned checkpoint.
#[derive(Debug)]
pub struct PartitionedCheckpoint {
    pub tick: u64,
    pub partitions: Vec<Vec<Shared<dyn Serializable>>>,
}

/// Serialize per-partition root sets, one independent context each.
/// Objects are never shared across partitions; each partition's identity
/// space starts fresh.
pub fn write_partitioned(
    registry: &Arc<TypeRegistry>,
    tick: u64,
    partitions: &mut [Vec<Shared<dyn Serializable>>],
) -> Result<Vec<u8>, CheckpointError> {
    let mut outer = Serializer::packing(Arc::clone(registry));
    let mut header = CheckpointHeader::new(PARTITIONED_MAGIC, tick, count_of(partitions.len())?);
    outer.root(&mut header)?;

    for (index, roots) in partitions.iter_mut().enumerate() {
        let mut blob = pack_partition(registry, roots)
            .map_err(|source| CheckpointError::Partition { index, source })?;
        outer.root(&mut blob)?;
    }
    Ok(outer.finish()?)
}

fn pack_partition(
    registry: &Arc<TypeRegistry>,
    roots: &mut [Shared<dyn Serializable>],
) -> Result<Vec<u8>, SerError> {
    let mut ser = Serializer::packing(Arc::clone(registry));
    let mut count = count_of(roots.len())?;
    ser.root(&mut count)?;
    for root in roots.iter_mut() {
        ser.root(root)?;
    }
    ser.finish()
}

/// Reconstruct every partition of a partitioned checkpoint.
pub fn read_partitioned(
    registry: &Arc<TypeRegistry>,
    data: &[u8],
) -> Result<PartitionedCheckpoint, CheckpointError> {
    let mut outer = Serializer::unpacking(Arc::clone(registry), data);
    let mut header = CheckpointHeader::default();
    outer.root(&mut header)?;
    header.validate(PARTITIONED_MAGIC)?;

    let mut partitions = Vec::new();
    for index in 0..header.count as usize {
        let mut blob: Vec<u8> = Vec::new();
        outer.root(&mut blob)?;
        let roots = unpack_partition(registry, &blob)
            .map_err(|source| CheckpointError::Partition { index, source })?;
        partitions.push(roots);
    }
    outer.expect_end()?;
    Ok(PartitionedCheckpoint {
        tick: header.tick,
        partitions,
    })
}

fn unpack_partition(
    registry: &Arc<TypeRegistry>,
    blob: &[u8],
) -> Result<Vec<Shared<dyn Serializable>>, SerError> {
    let mut ser = Serializer::unpacking(Arc::clone(registry), blob);
    let mut count = 0u32;
    ser.root(&mut count)?;
    let mut roots = Vec::new();
    for _ in 0..count {
        let mut root = Shared::<dyn Serializable>::default();
        ser.root(&mut root)?;
        roots.push(root);
    }
    ser.expect_end()?;
    Ok(roots)
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

/// Detected checkpoint stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointFormat {
    Single,
    Partitioned,
    Unknown,
}

/// Inspect the magic number without decoding anything else.
pub fn detect_format(data: &[u8]) -> CheckpointFormat {
    let mut reader = WireReader::new(data);
    match reader.read_u32() {
        Ok(CHECKPOINT_MAGIC) => CheckpointFormat::Single,
        Ok(PARTITIONED_MAGIC) => CheckpointFormat::Partitioned,
        _ => CheckpointFormat::Unknown,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
