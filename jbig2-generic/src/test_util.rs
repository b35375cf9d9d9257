//! Bit sources for exercising the region decoders without coded data.

use alloc::vec::Vec;

use crate::arithmetic_decoder::{ArithmeticSource, Context};

/// Replays a fixed sequence of bits, ignoring the context contents.
///
/// Every decode bumps the index of the context it was given, so after a
/// decode the context slice holds the number of times each context was used.
/// The source reports completion once all bits are used up.
pub(crate) struct ScriptedSource {
    bits: Vec<u32>,
    position: usize,
}

impl ScriptedSource {
    pub(crate) fn new(bits: &[u32]) -> Self {
        Self {
            bits: bits.to_vec(),
            position: 0,
        }
    }

    /// `count` pseudo-random bits.
    pub(crate) fn noise(seed: u32, count: usize) -> Self {
        let mut state = seed | 1;
        let bits = (0..count)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 7) & 1
            })
            .collect();

        Self { bits, position: 0 }
    }

    /// Number of bits handed out so far.
    pub(crate) fn decoded(&self) -> usize {
        self.position
    }
}

impl ArithmeticSource for ScriptedSource {
    fn decode(&mut self, context: &mut Context) -> u32 {
        let bit = self.bits.get(self.position).copied().unwrap_or(0);
        self.position += 1;
        context.index += 1;
        bit
    }

    fn is_complete(&self) -> bool {
        self.position >= self.bits.len()
    }
}

/// Usage count of every context, as recorded by [`ScriptedSource`].
pub(crate) fn usage(contexts: &[Context]) -> Vec<u32> {
    contexts.iter().map(|c| c.index).collect()
}
