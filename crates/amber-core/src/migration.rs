//! Checkpoint format migration.
//!
//! A registry of step functions, each transforming serialized checkpoint
//! bytes from one format version to the next. Steps are chained so a
//! stream several versions old can still be brought up to the current
//! format before decoding.

use std::collections::BTreeMap;

/// Errors raised while migrating checkpoint bytes between versions.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoPath { from: u32, to: u32 },
    #[error("migration step {from} -> {to} failed: {reason}")]
    StepFailed { from: u32, to: u32, reason: String },
}

/// Transforms bytes at version N into bytes at version N + 1.
pub type MigrationStep = fn(&[u8]) -> Result<Vec<u8>, MigrationError>;

/// Registry of migration steps keyed by source version.
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    steps: BTreeMap<u32, MigrationStep>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step that migrates `from_version` to `from_version + 1`.
    pub fn register_step(&mut self, from_version: u32, step: MigrationStep) {
        self.steps.insert(from_version, step);
    }

    /// Whether a complete chain exists from `from` to `to`.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        if from >= to {
            return from == to;
        }
        (from..to).all(|v| self.steps.contains_key(&v))
    }

    /// Run the chain. Returns the input unchanged when `from == to`.
    pub fn apply(&self, data: &[u8], from: u32, to: u32) -> Result<Vec<u8>, MigrationError> {
        if from == to {
            return Ok(data.to_vec());
        }
        if from > to {
            return Err(MigrationError::NoPath { from, to });
        }
        let mut current = data.to_vec();
        for version in from..to {
            let step = self
                .steps
                .get(&version)
                .ok_or(MigrationError::NoPath { from, to })?;
            current = step(&current)?;
        }
        Ok(current)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
