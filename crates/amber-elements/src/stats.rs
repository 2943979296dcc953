//! Fixed-point statistics accumulators.
//!
//! Deterministic Q32.32 math so two ranks accumulating the same samples
//! produce bit-identical state, and therefore bit-identical checkpoints.

use amber_core::context::{SerError, Serializer};
use amber_core::serialize::Serialize;
use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Running min/max/mean over fixed-point samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    pub count: u64,
    pub total: Fixed64,
    pub min: Fixed64,
    pub max: Fixed64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            total: Fixed64::ZERO,
            min: Fixed64::MAX,
            max: Fixed64::MIN,
        }
    }

    pub fn record(&mut self, sample: Fixed64) {
        self.count += 1;
        self.total += sample;
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
    }

    /// Mean of the recorded samples; zero before the first sample.
    pub fn mean(&self) -> Fixed64 {
        if self.count == 0 {
            return Fixed64::ZERO;
        }
        self.total / Fixed64::from_num(self.count)
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Accumulator {
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), SerError> {
        self.count.serialize(ser)?;
        // fixed-point values travel as their raw bit patterns
        let mut total = self.total.to_bits();
        total.serialize(ser)?;
        self.total = Fixed64::from_bits(total);
        let mut min = self.min.to_bits();
        min.serialize(ser)?;
        self.min = Fixed64::from_bits(min);
        let mut max = self.max.to_bits();
        max.serialize(ser)?;
        self.max = Fixed64::from_bits(max);
        Ok(())
    }
}
