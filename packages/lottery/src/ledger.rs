//! Entry ledger for the live round.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::LotteryError;
use crate::types::LotteryState;

/// The single live round of a lottery instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub state: LotteryState,
    /// Unix seconds of the last finalized draw (or of instance creation)
    pub last_draw_timestamp: u64,
    /// Entries in arrival order; the same participant may appear more than once
    pub players: Vec<Address>,
    /// Pooled contributions for this round
    pub balance: U256,
}

impl Round {
    pub fn new(opened_at: u64) -> Self {
        Self {
            state: LotteryState::Open,
            last_draw_timestamp: opened_at,
            players: Vec::new(),
            balance: U256::ZERO,
        }
    }

    /// Record an entry. The whole contribution joins the pool.
    pub fn enter(
        &mut self,
        participant: Address,
        contribution: U256,
        entry_fee: U256,
    ) -> Result<(), LotteryError> {
        if contribution < entry_fee {
            return Err(LotteryError::InsufficientContribution {
                sent: contribution,
                required: entry_fee,
            });
        }
        if self.state != LotteryState::Open {
            return Err(LotteryError::RoundClosed);
        }

        self.players.push(participant);
        self.balance = self.balance.saturating_add(contribution);
        Ok(())
    }

    pub fn player(&self, index: usize) -> Result<Address, LotteryError> {
        self.players
            .get(index)
            .copied()
            .ok_or(LotteryError::InvalidPlayerIndex {
                index,
                player_count: self.players.len(),
            })
    }

    /// Start a fresh round after a finalized draw
    pub fn reset(&mut self, now: u64) {
        self.players.clear();
        self.balance = U256::ZERO;
        self.last_draw_timestamp = now;
        self.state = LotteryState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: u64 = 100;

    fn player(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_enter_appends_in_order() {
        let mut round = Round::new(0);
        round.enter(player(1), U256::from(FEE), U256::from(FEE)).unwrap();
        round.enter(player(2), U256::from(FEE + 5), U256::from(FEE)).unwrap();
        round.enter(player(1), U256::from(FEE), U256::from(FEE)).unwrap();

        assert_eq!(round.players, vec![player(1), player(2), player(1)]);
        assert_eq!(round.balance, U256::from(3 * FEE + 5));
        assert_eq!(round.player(1).unwrap(), player(2));
    }

    #[test]
    fn test_enter_below_fee_leaves_players_unchanged() {
        let mut round = Round::new(0);
        round.enter(player(1), U256::from(FEE), U256::from(FEE)).unwrap();

        for sent in [0, 1, FEE - 1] {
            let err = round
                .enter(player(2), U256::from(sent), U256::from(FEE))
                .unwrap_err();
            assert_eq!(
                err,
                LotteryError::InsufficientContribution {
                    sent: U256::from(sent),
                    required: U256::from(FEE),
                }
            );
        }

        assert_eq!(round.players, vec![player(1)]);
        assert_eq!(round.balance, U256::from(FEE));
    }

    #[test]
    fn test_enter_while_drawing_is_closed() {
        let mut round = Round::new(0);
        round.state = LotteryState::Drawing;

        let err = round
            .enter(player(1), U256::from(FEE), U256::from(FEE))
            .unwrap_err();
        assert_eq!(err, LotteryError::RoundClosed);
        assert!(round.players.is_empty());
    }

    #[test]
    fn test_player_out_of_range() {
        let round = Round::new(0);
        assert_eq!(
            round.player(0).unwrap_err(),
            LotteryError::InvalidPlayerIndex {
                index: 0,
                player_count: 0
            }
        );
    }

    #[test]
    fn test_reset() {
        let mut round = Round::new(10);
        round.enter(player(1), U256::from(FEE), U256::from(FEE)).unwrap();
        round.state = LotteryState::Drawing;

        round.reset(99);

        assert_eq!(round, Round::new(99));
    }
}
