//! Schema dump for packed checkpoints.
//!
//! When a recorder is attached to a packing context, every polymorphic
//! record contributes one segment (type, offset, encoded size), and the
//! registry contributes a table of registered types with their declared
//! field descriptors. The result renders to JSON for offline inspection
//! of checkpoint layouts. Purely observational: the wire bytes are
//! identical with or without a recorder attached.

use crate::id::TypeId;
use crate::registry::TypeRegistry;

/// One encoded polymorphic record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SegmentInfo {
    pub name: &'static str,
    pub type_id: u32,
    pub offset: usize,
    pub size: usize,
}

/// One registered type.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TypeInfo {
    pub type_id: u32,
    pub name: &'static str,
    pub fields: Vec<FieldInfo>,
}

/// One declared field of a registered type.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: &'static str,
}

#[derive(serde::Serialize)]
struct SchemaDoc<'a> {
    checkpoint_def: &'a [SegmentInfo],
    type_info: &'a [TypeInfo],
}

/// Collects segment and type information during one packing pass.
#[derive(Debug)]
pub struct SchemaRecorder {
    segments: Vec<SegmentInfo>,
    types: Vec<TypeInfo>,
}

impl SchemaRecorder {
    pub(crate) fn new(registry: &TypeRegistry) -> Self {
        let types = registry
            .records()
            .map(|record| TypeInfo {
                type_id: record.type_id().0,
                name: record.name(),
                fields: record
                    .fields()
                    .iter()
                    .map(|field| FieldInfo {
                        name: field.name,
                        kind: field.kind.as_str(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            segments: Vec::new(),
            types,
        }
    }

    pub(crate) fn record_segment(
        &mut self,
        name: &'static str,
        type_id: TypeId,
        start: usize,
        end: usize,
    ) {
        self.segments.push(SegmentInfo {
            name,
            type_id: type_id.0,
            offset: start,
            size: end - start,
        });
    }

    pub fn segments(&self) -> &[SegmentInfo] {
        &self.segments
    }

    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    /// Render the collected schema as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&SchemaDoc {
            checkpoint_def: &self.segments,
            type_info: &self.types,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use crate::context::Serializer;
    use crate::shared::Shared;
    use crate::test_utils::{test_registry, Leaf, LEAF_TYPE};
    use std::sync::Arc;

    #[test]
    fn segments_cover_polymorphic_records() {
        let reg = test_registry();
        let mut ser = Serializer::packing(Arc::clone(&reg));
        ser.enable_schema();

        let mut a = Shared::new(Leaf {
            label: String::from("a"),
            value: 1,
        })
        .into_dyn();
        let mut b = a.clone();
        ser.root(&mut a).unwrap();
        ser.root(&mut b).unwrap(); // back-reference: no new segment

        let schema = ser.take_schema().unwrap();
        assert_eq!(schema.segments().len(), 1);
        let seg = &schema.segments()[0];
        assert_eq!(seg.name, "leaf");
        assert_eq!(seg.type_id, LEAF_TYPE.0);
        assert_eq!(seg.offset, 0);
        assert!(seg.size > 0);
    }

    #[test]
    fn type_table_reflects_the_registry() {
        let reg = test_registry();
        let mut ser = Serializer::packing(Arc::clone(&reg));
        ser.enable_schema();
        let schema = ser.take_schema().unwrap();
        assert!(schema.types().iter().any(|t| t.name == "leaf"));
        let leaf = schema.types().iter().find(|t| t.name == "leaf").unwrap();
        assert!(leaf.fields.iter().any(|f| f.name == "value"));
    }

    #[test]
    fn recorder_does_not_change_the_wire() {
        let reg = test_registry();

        let mut plain = Serializer::packing(Arc::clone(&reg));
        let mut root = Shared::new(Leaf {
            label: String::from("x"),
            value: 2,
        })
        .into_dyn();
        plain.root(&mut root.clone()).unwrap();
        let without = plain.finish().unwrap();

        let mut recorded = Serializer::packing(reg);
        recorded.enable_schema();
        recorded.root(&mut root).unwrap();
        let with = recorded.finish().unwrap();

        assert_eq!(without, with);
    }

    #[test]
    fn json_output_names_both_tables() {
        let reg = test_registry();
        let mut ser = Serializer::packing(reg);
        ser.enable_schema();
        let mut root = Shared::new(Leaf::default()).into_dyn();
        ser.root(&mut root).unwrap();

        let json = ser.schema().unwrap().to_json().unwrap();
        assert!(json.contains("checkpoint_def"));
        assert!(json.contains("type_info"));
        assert!(json.contains("leaf"));
    }
}
