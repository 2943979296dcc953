//! Amber Elements -- concrete simulation element types.
//!
//! A library of checkpointable components, events, and statistics the
//! way a simulation built on `amber-core` declares them: every type
//! carries a stable [`amber_core::id::TypeId`], a field-descriptor list,
//! and one `serialize_order` used by both packing and unpacking.
//!
//! The set deliberately exercises every codec path: variant payloads,
//! event queues, fixed arrays, shared downstream links and weak upstream
//! back-links (including cycles), polymorphic member lists, ordered and
//! unordered routing tables, atomics, and fixed-point statistics.
//!
//! # Type identifiers
//!
//! | id | type |
//! |----|------|
//! | 10 | [`event::PulseEvent`] |
//! | 11 | [`event::BurstEvent`] |
//! | 12 | [`component::Oscillator`] |
//! | 13 | [`component::Relay`] |
//! | 14 | [`component::Hub`] |

pub mod component;
pub mod event;
pub mod payload;
pub mod stats;

use amber_core::registry::{RegistryError, TypeRegistryBuilder};

/// Register every element type under its stable identifier.
pub fn register_elements(builder: &mut TypeRegistryBuilder) -> Result<(), RegistryError> {
    builder.register::<event::PulseEvent>(
        event::PULSE_EVENT_TYPE,
        "pulse_event",
        event::PULSE_EVENT_FIELDS,
    )?;
    builder.register::<event::BurstEvent>(
        event::BURST_EVENT_TYPE,
        "burst_event",
        event::BURST_EVENT_FIELDS,
    )?;
    builder.register::<component::Oscillator>(
        component::OSCILLATOR_TYPE,
        "oscillator",
        component::OSCILLATOR_FIELDS,
    )?;
    builder.register::<component::Relay>(
        component::RELAY_TYPE,
        "relay",
        component::RELAY_FIELDS,
    )?;
    builder.register::<component::Hub>(component::HUB_TYPE, "hub", component::HUB_FIELDS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_elements_register_once() {
        let mut builder = TypeRegistryBuilder::new();
        register_elements(&mut builder).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains(event::PULSE_EVENT_TYPE));
        assert!(registry.contains(component::HUB_TYPE));
    }

    #[test]
    fn double_registration_is_a_duplicate_error() {
        let mut builder = TypeRegistryBuilder::new();
        register_elements(&mut builder).unwrap();
        let err = register_elements(&mut builder).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType { .. }));
    }
}
