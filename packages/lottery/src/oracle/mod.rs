//! Boundary to the verifiable randomness provider.
//!
//! A request returns its id immediately; the matching [`Fulfillment`] arrives
//! later on a channel owned by the provider, never on the caller's task.

use async_trait::async_trait;

use crate::errors::LotteryError;
use crate::types::{OracleRequestParams, RequestId};

pub mod commit_reveal;
pub mod random_derivation;

pub use commit_reveal::{verify_reveal, CommitRevealOracle};
pub use random_derivation::RandomDerivation;

/// A source of verifiable randomness with asynchronous delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RandomnessOracle: Send + Sync {
    /// Issue a request and return its id. Exactly one fulfillment for the id
    /// is delivered later.
    async fn request_random_words(
        &self,
        params: &OracleRequestParams,
    ) -> Result<RequestId, LotteryError>;
}
