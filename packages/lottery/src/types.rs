//! Core data types shared across the lottery service.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Identifier returned by the randomness provider for an issued request
pub type RequestId = U256;

/// Round state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotteryState {
    /// Accepting entries, no request outstanding
    #[default]
    Open,
    /// Closed for entries, one randomness request outstanding
    Drawing,
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Drawing => write!(f, "DRAWING"),
        }
    }
}

/// In-flight randomness request. Exists only while the round is drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request_id: RequestId,
    /// Unix seconds
    pub issued_at: u64,
}

/// A completed round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRecord {
    /// Sequential round number, starting at 1
    pub round_index: u64,
    /// Unix seconds at which the winner was finalized
    pub timestamp: u64,
    pub winner: Address,
    pub payout_amount: U256,
}

/// Parameters forwarded to the randomness provider with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequestParams {
    /// Gas lane / key hash identifying the provider's proving key
    pub key_hash: B256,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    #[serde(default = "default_num_words")]
    pub num_words: u32,
}

fn default_num_words() -> u32 {
    1
}

impl Default for OracleRequestParams {
    fn default() -> Self {
        Self {
            key_hash: B256::ZERO,
            subscription_id: 0,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: default_num_words(),
        }
    }
}

/// Callback delivered by the randomness provider, exactly once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub random_words: Vec<U256>,
    /// Provider-specific proof material (the revealed seed for commit-reveal)
    pub proof: B256,
}

/// Draw that was selected but whose payout did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkedPayout {
    pub request_id: RequestId,
    pub winner_index: usize,
    pub winner: Address,
    pub amount: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&LotteryState::Drawing).unwrap(),
            "\"DRAWING\""
        );
        let state: LotteryState = serde_json::from_str("\"OPEN\"").unwrap();
        assert_eq!(state, LotteryState::Open);
        assert_eq!(LotteryState::default(), LotteryState::Open);
    }

    #[test]
    fn test_oracle_params_default_one_word() {
        let json = r#"{
            "key_hash": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "subscription_id": 7,
            "request_confirmations": 3,
            "callback_gas_limit": 500000
        }"#;

        let params: OracleRequestParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.num_words, 1);
        assert_eq!(params.subscription_id, 7);
    }
}
