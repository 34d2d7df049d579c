use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

/// Deterministic word derivation from combined entropy sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomDerivation {
    pub seed: B256,
}

impl RandomDerivation {
    pub fn new(seed: B256) -> Self {
        Self { seed }
    }

    /// Create a derivation by combining multiple entropy sources
    pub fn from_sources(sources: &[&[u8]]) -> Self {
        let mut combined = Vec::new();
        for source in sources {
            combined.extend_from_slice(source);
        }
        Self::new(keccak256(&combined))
    }

    /// Word at `index`: keccak256(seed || index)
    pub fn word(&self, index: u64) -> U256 {
        let mut data = self.seed.as_slice().to_vec();
        data.extend_from_slice(&index.to_be_bytes());
        U256::from_be_bytes(keccak256(&data).0)
    }

    pub fn words(&self, count: u32) -> Vec<U256> {
        (0..count as u64).map(|i| self.word(i)).collect()
    }
}

/// Commitment published before a seed is revealed
pub fn commitment(seed: &B256) -> B256 {
    keccak256(seed.as_slice())
}
