use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::types::LotteryState;

/// Error type for lottery operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Contribution below the configured entry fee
    #[error("Insufficient contribution: sent {sent}, entry fee is {required}")]
    InsufficientContribution { sent: U256, required: U256 },

    /// Entries are only accepted while the round is open
    #[error("Round is closed for entries")]
    RoundClosed,

    /// The upkeep predicate does not hold; carries the state that was observed
    #[error(
        "Upkeep not needed: balance={balance}, players={player_count}, state={state}"
    )]
    UpkeepNotNeeded {
        balance: U256,
        player_count: usize,
        state: LotteryState,
    },

    /// Callback for a request id that is not outstanding
    #[error("No such request: {0}")]
    UnknownRequest(U256),

    /// The oracle delivered no words for the request
    #[error("Fulfillment for request {0} carried no random words")]
    MissingRandomWords(U256),

    /// Payment rail refused or could not reach the winner
    #[error("Payout of {amount} to {winner} failed: {reason}")]
    PayoutFailed {
        winner: Address,
        amount: U256,
        reason: String,
    },

    /// `retry_payout` was called with nothing parked
    #[error("No parked payout to retry")]
    NoParkedPayout,

    /// Query for a player slot that does not exist
    #[error("Invalid player index {index}, round has {player_count} players")]
    InvalidPlayerIndex { index: usize, player_count: usize },

    /// Randomness provider errors
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error reported by a payment rail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Destination refused the transfer
    #[error("Destination {0} rejected the transfer")]
    Rejected(Address),

    /// Destination could not be reached
    #[error("Destination unreachable: {0}")]
    Unreachable(String),
}
