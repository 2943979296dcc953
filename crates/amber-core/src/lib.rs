//! Amber Core -- checkpoint/restart serialization for object graphs.
//!
//! This crate converts a richly-typed, pointer-connected object graph
//! (simulation components, events, statistics, containers, smart
//! references) into a byte stream and reconstructs an equivalent live
//! graph from that stream later, preserving sharing, polymorphic
//! identity, and container semantics exactly. Re-encoding a restored
//! graph reproduces the original stream byte for byte.
//!
//! # One Ordering Function
//!
//! A type joins the graph by implementing [`serialize::Serialize`] (plain
//! fields) or [`shared::Serializable`] (objects behind shared or
//! polymorphic references). Both declare a single, mode-symmetric
//! ordering function: the same code packs and unpacks, so fields are
//! always decoded in the exact order they were encoded.
//!
//! # Driving a Pass
//!
//! ```rust,ignore
//! let mut builder = TypeRegistryBuilder::new();
//! builder.register::<Pulse>(TypeId(10), "pulse", PULSE_FIELDS)?;
//! let registry = Arc::new(builder.build()?);
//!
//! let mut ser = Serializer::packing(Arc::clone(&registry));
//! ser.root(&mut root)?;
//! let bytes = ser.finish()?;
//! ```
//!
//! # Key Types
//!
//! - [`context::Serializer`] -- the serialization context: one pack or
//!   unpack pass, one object table, mode fixed at construction.
//! - [`registry::TypeRegistry`] -- immutable registry of serializable
//!   types (frozen at startup, shared across threads).
//! - [`shared::Shared`] / [`shared::WeakRef`] -- identity-tracked
//!   references; cycles and cross-references survive round trips.
//! - [`checkpoint`] -- versioned checkpoint envelopes, single and
//!   partitioned, with format migration support.
//! - [`wire`] -- the byte-level codec: fixed widths, little-endian,
//!   length prefixes, offset-carrying errors.

pub mod atomic;
pub mod checkpoint;
pub mod containers;
pub mod context;
pub mod id;
pub mod migration;
pub mod registry;
#[cfg(feature = "schema")]
pub mod schema;
pub mod serialize;
pub mod shared;
pub(crate) mod track;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
