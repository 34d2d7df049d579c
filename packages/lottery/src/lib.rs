//! Recurring lottery draw service.
//!
//! Participants pay a fixed entry fee to join the live round. Once the draw
//! interval has elapsed a keeper closes the round and asks a verifiable
//! randomness provider for a word; when the provider calls back, the winner
//! at `word % players` is paid the whole pool and a new round opens.

pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod history;
pub mod keeper;
pub mod ledger;
pub mod lottery;
pub mod oracle;
pub mod payment;
pub mod types;
pub mod upkeep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LotteryConfig;
pub use errors::{LotteryError, PaymentError};
pub use events::LotteryEvent;
pub use keeper::{Keeper, KeeperReport};
pub use lottery::{Lottery, LotterySnapshot};
pub use oracle::{CommitRevealOracle, RandomnessOracle};
pub use payment::{InMemoryPaymentRail, PaymentRail};
pub use types::{
    Fulfillment, LotteryRecord, LotteryState, OracleRequestParams, ParkedPayout, PendingRequest,
    RequestId,
};
