use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::ledger::Round;
use crate::types::LotteryState;

/// Everything the upkeep predicate looked at, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub time_passed: bool,
    pub is_open: bool,
    pub has_balance: bool,
    pub has_players: bool,
    pub balance: U256,
    pub player_count: usize,
    pub state: LotteryState,
}

/// Decide whether a draw may begin. Pure: no side effects.
pub fn check_upkeep(round: &Round, now: u64, interval_secs: u64) -> UpkeepCheck {
    let time_passed = now.saturating_sub(round.last_draw_timestamp) >= interval_secs
        && now >= round.last_draw_timestamp;
    let is_open = round.state == LotteryState::Open;
    let has_balance = round.balance > U256::ZERO;
    let has_players = !round.players.is_empty();

    UpkeepCheck {
        upkeep_needed: time_passed && is_open && has_balance && has_players,
        time_passed,
        is_open,
        has_balance,
        has_players,
        balance: round.balance,
        player_count: round.players.len(),
        state: round.state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const INTERVAL: u64 = 3600;

    fn funded_round() -> Round {
        let mut round = Round::new(1_000);
        round
            .enter(Address::repeat_byte(1), U256::from(10u64), U256::from(10u64))
            .unwrap();
        round
    }

    #[test]
    fn test_upkeep_needed_when_all_conditions_hold() {
        let round = funded_round();
        let check = check_upkeep(&round, 1_000 + INTERVAL, INTERVAL);

        assert!(check.upkeep_needed);
        assert_eq!(check.player_count, 1);
        assert_eq!(check.balance, U256::from(10u64));
    }

    #[test]
    fn test_upkeep_not_needed_before_interval() {
        let round = funded_round();
        let check = check_upkeep(&round, 1_000 + INTERVAL - 1, INTERVAL);

        assert!(!check.upkeep_needed);
        assert!(!check.time_passed);
    }

    #[test]
    fn test_upkeep_not_needed_while_drawing() {
        let mut round = funded_round();
        round.state = LotteryState::Drawing;

        let check = check_upkeep(&round, 1_000 + INTERVAL + 1, INTERVAL);
        assert!(!check.upkeep_needed);
        assert!(!check.is_open);
    }

    #[test]
    fn test_upkeep_not_needed_without_players_or_balance() {
        let round = Round::new(1_000);
        let check = check_upkeep(&round, 1_000 + INTERVAL + 1, INTERVAL);
        assert!(!check.upkeep_needed);
        assert!(!check.has_players);
        assert!(!check.has_balance);

        // zero fee entries: players but no balance
        let mut round = Round::new(1_000);
        round
            .enter(Address::repeat_byte(1), U256::ZERO, U256::ZERO)
            .unwrap();
        let check = check_upkeep(&round, 1_000 + INTERVAL + 1, INTERVAL);
        assert!(check.has_players);
        assert!(!check.upkeep_needed);
    }

    #[test]
    fn test_clock_behind_last_draw() {
        let round = funded_round();
        let check = check_upkeep(&round, 10, 0);
        assert!(!check.time_passed);
    }
}
