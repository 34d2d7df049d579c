//! Draw coordinator: the round state machine.
//!
//! ```text
//! OPEN --perform_upkeep--> DRAWING --fulfill + payout ok--> OPEN
//!                             |  \--payout fails--> DRAWING (parked) --retry_payout--> OPEN
//!                             \--request expired--> OPEN (players kept)
//! ```
//!
//! Every mutating entry point runs inside one async mutex, including the
//! payout, so a draw is staged, paid and committed without any other caller
//! observing the intermediate state. The draw is parked before the payout is
//! attempted, so an interrupted payout can still be finished with
//! `retry_payout`.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::config::LotteryConfig;
use crate::errors::LotteryError;
use crate::events::{EventBus, LotteryEvent};
use crate::history::HistoryRecorder;
use crate::ledger::Round;
use crate::oracle::RandomnessOracle;
use crate::payment::PaymentRail;
use crate::types::{
    Fulfillment, LotteryRecord, LotteryState, ParkedPayout, PendingRequest, RequestId,
};
use crate::upkeep::{check_upkeep, UpkeepCheck};

struct LotteryInner {
    round: Round,
    pending: Option<PendingRequest>,
    parked: Option<ParkedPayout>,
    recent_winner: Option<Address>,
    round_count: u64,
    history: HistoryRecorder,
}

/// Point-in-time view of a lottery instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotterySnapshot {
    pub state: LotteryState,
    pub players: Vec<Address>,
    pub balance: U256,
    pub last_draw_timestamp: u64,
    pub recent_winner: Option<Address>,
    pub pending_request: Option<PendingRequest>,
    pub parked_payout: Option<ParkedPayout>,
    pub round_count: u64,
}

/// A recurring lottery instance
pub struct Lottery {
    config: LotteryConfig,
    inner: Mutex<LotteryInner>,
    oracle: Arc<dyn RandomnessOracle>,
    payments: Arc<dyn PaymentRail>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl Lottery {
    pub fn new(
        config: LotteryConfig,
        oracle: Arc<dyn RandomnessOracle>,
        payments: Arc<dyn PaymentRail>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LotteryError> {
        config.validate()?;

        let inner = LotteryInner {
            round: Round::new(clock.now()),
            pending: None,
            parked: None,
            recent_winner: None,
            round_count: 0,
            history: HistoryRecorder::new(),
        };

        Ok(Self {
            config,
            inner: Mutex::new(inner),
            oracle,
            payments,
            clock,
            events: EventBus::new(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &LotteryConfig {
        &self.config
    }

    /// Join the current round
    pub async fn enter(&self, participant: Address, contribution: U256) -> Result<(), LotteryError> {
        let mut inner = self.inner.lock().await;
        inner
            .round
            .enter(participant, contribution, self.config.entry_fee)?;

        info!(
            player = %participant,
            contribution = %contribution,
            players = inner.round.players.len(),
            "entered lottery"
        );
        self.events
            .emit(LotteryEvent::EnteredLottery { player: participant });
        Ok(())
    }

    /// Whether a draw may begin now
    pub async fn check_upkeep(&self) -> bool {
        self.upkeep_status().await.upkeep_needed
    }

    /// The full upkeep evaluation, for diagnostics
    pub async fn upkeep_status(&self) -> UpkeepCheck {
        let inner = self.inner.lock().await;
        check_upkeep(&inner.round, self.clock.now(), self.config.interval_secs)
    }

    /// Close the round and request randomness for the draw
    pub async fn perform_upkeep(&self) -> Result<RequestId, LotteryError> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();

        let check = check_upkeep(&inner.round, now, self.config.interval_secs);
        if !check.upkeep_needed {
            return Err(LotteryError::UpkeepNotNeeded {
                balance: check.balance,
                player_count: check.player_count,
                state: check.state,
            });
        }

        inner.round.state = LotteryState::Drawing;

        let request_id = match self.oracle.request_random_words(&self.config.oracle).await {
            Ok(request_id) => request_id,
            Err(e) => {
                inner.round.state = LotteryState::Open;
                error!(error = %e, "randomness request failed, round re-opened");
                return Err(e);
            }
        };

        inner.pending = Some(PendingRequest {
            request_id,
            issued_at: now,
        });

        info!(
            request_id = %request_id,
            players = inner.round.players.len(),
            balance = %inner.round.balance,
            "requested winner"
        );
        self.events
            .emit(LotteryEvent::RequestedWinner { request_id });
        Ok(request_id)
    }

    /// Consume the randomness for the outstanding request: pick, pay, reset
    pub async fn fulfill_random_words(
        &self,
        request_id: RequestId,
        random_words: &[U256],
    ) -> Result<Address, LotteryError> {
        let mut inner = self.inner.lock().await;

        match inner.pending {
            Some(pending) if pending.request_id == request_id => {}
            _ => return Err(LotteryError::UnknownRequest(request_id)),
        }
        let word = random_words
            .first()
            .copied()
            .ok_or(LotteryError::MissingRandomWords(request_id))?;

        let player_count = inner.round.players.len();
        let winner_index =
            winner_index(word, player_count).ok_or(LotteryError::InvalidPlayerIndex {
                index: 0,
                player_count,
            })?;
        let winner = inner.round.player(winner_index)?;

        let draw = ParkedPayout {
            request_id,
            winner_index,
            winner,
            amount: inner.round.balance,
        };

        // staged before the payout await so a dropped future leaves a retryable draw
        inner.pending = None;
        inner.parked = Some(draw.clone());

        self.settle(&mut inner, draw, true).await
    }

    /// Re-attempt a payout that failed during fulfillment
    pub async fn retry_payout(&self) -> Result<Address, LotteryError> {
        let mut inner = self.inner.lock().await;
        let draw = inner.parked.clone().ok_or(LotteryError::NoParkedPayout)?;

        info!(
            request_id = %draw.request_id,
            winner = %draw.winner,
            amount = %draw.amount,
            "retrying parked payout"
        );
        self.settle(&mut inner, draw, false).await
    }

    /// Drop an unanswered request older than the configured timeout and
    /// re-open the round with its players. Returns the expired id, if any.
    pub async fn expire_pending_request(&self) -> Result<Option<RequestId>, LotteryError> {
        let Some(timeout) = self.config.request_timeout_secs else {
            return Ok(None);
        };

        let mut inner = self.inner.lock().await;
        let now = self.clock.now();

        let Some(pending) = inner.pending else {
            return Ok(None);
        };
        if now.saturating_sub(pending.issued_at) < timeout {
            return Ok(None);
        }

        inner.pending = None;
        inner.round.state = LotteryState::Open;

        warn!(
            request_id = %pending.request_id,
            age_secs = now.saturating_sub(pending.issued_at),
            "randomness request expired, round re-opened"
        );
        self.events.emit(LotteryEvent::RequestExpired {
            request_id: pending.request_id,
        });
        Ok(Some(pending.request_id))
    }

    /// Consume oracle callbacks until the channel closes
    pub async fn run_fulfillments(&self, mut fulfillments: mpsc::UnboundedReceiver<Fulfillment>) {
        while let Some(fulfillment) = fulfillments.recv().await {
            match self
                .fulfill_random_words(fulfillment.request_id, &fulfillment.random_words)
                .await
            {
                Ok(winner) => {
                    info!(request_id = %fulfillment.request_id, winner = %winner, "draw completed");
                }
                Err(e @ LotteryError::PayoutFailed { .. }) => {
                    error!(request_id = %fulfillment.request_id, error = %e, "payout parked");
                }
                Err(e) => {
                    warn!(request_id = %fulfillment.request_id, error = %e, "fulfillment rejected");
                }
            }
        }
        info!("fulfillment channel closed");
    }

    /// Pay the staged draw and commit it. `inner.parked` must already hold
    /// `draw`; it is cleared only once the payout went through.
    async fn settle(
        &self,
        inner: &mut LotteryInner,
        draw: ParkedPayout,
        first_attempt: bool,
    ) -> Result<Address, LotteryError> {
        if let Err(e) = self.payments.pay(draw.winner, draw.amount).await {
            warn!(
                request_id = %draw.request_id,
                winner = %draw.winner,
                amount = %draw.amount,
                error = %e,
                "payout failed, round stays drawing"
            );
            if first_attempt {
                self.events.emit(LotteryEvent::PayoutParked {
                    request_id: draw.request_id,
                    winner: draw.winner,
                    amount: draw.amount,
                });
            }
            return Err(LotteryError::PayoutFailed {
                winner: draw.winner,
                amount: draw.amount,
                reason: e.to_string(),
            });
        }

        let now = self.clock.now();
        inner.round_count += 1;
        inner.history.record_round(LotteryRecord {
            round_index: inner.round_count,
            timestamp: now,
            winner: draw.winner,
            payout_amount: draw.amount,
        });
        inner.recent_winner = Some(draw.winner);
        inner.parked = None;
        inner.round.reset(now);

        info!(
            round = inner.round_count,
            winner = %draw.winner,
            winner_index = draw.winner_index,
            payout = %draw.amount,
            "picked winner"
        );
        self.events
            .emit(LotteryEvent::PickedWinner { winner: draw.winner });
        Ok(draw.winner)
    }

    pub fn entry_fee(&self) -> U256 {
        self.config.entry_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval_secs
    }

    pub async fn lottery_state(&self) -> LotteryState {
        self.inner.lock().await.round.state
    }

    pub async fn player(&self, index: usize) -> Result<Address, LotteryError> {
        self.inner.lock().await.round.player(index)
    }

    pub async fn number_of_players(&self) -> usize {
        self.inner.lock().await.round.players.len()
    }

    pub async fn recent_winner(&self) -> Option<Address> {
        self.inner.lock().await.recent_winner
    }

    pub async fn last_timestamp(&self) -> u64 {
        self.inner.lock().await.round.last_draw_timestamp
    }

    pub async fn past_lotteries(&self) -> Vec<LotteryRecord> {
        self.inner.lock().await.history.list_rounds().to_vec()
    }

    /// Record for a 1-based round index
    pub async fn past_lottery(&self, round_index: u64) -> Option<LotteryRecord> {
        self.inner.lock().await.history.get(round_index).cloned()
    }

    pub async fn balance(&self) -> U256 {
        self.inner.lock().await.round.balance
    }

    pub async fn pending_request(&self) -> Option<PendingRequest> {
        self.inner.lock().await.pending
    }

    pub async fn parked_payout(&self) -> Option<ParkedPayout> {
        self.inner.lock().await.parked.clone()
    }

    pub async fn round_count(&self) -> u64 {
        self.inner.lock().await.round_count
    }

    pub async fn snapshot(&self) -> LotterySnapshot {
        let inner = self.inner.lock().await;
        LotterySnapshot {
            state: inner.round.state,
            players: inner.round.players.clone(),
            balance: inner.round.balance,
            last_draw_timestamp: inner.round.last_draw_timestamp,
            recent_winner: inner.recent_winner,
            pending_request: inner.pending,
            parked_payout: inner.parked.clone(),
            round_count: inner.round_count,
        }
    }
}

/// `word mod player_count`, or `None` for an empty round
fn winner_index(word: U256, player_count: usize) -> Option<usize> {
    if player_count == 0 {
        return None;
    }
    Some((word % U256::from(player_count)).as_limbs()[0] as usize)
}
