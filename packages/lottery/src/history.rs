use crate::types::LotteryRecord;

/// Append-only log of completed rounds. Round indices start at 1 and the
/// record for round `n` sits at position `n - 1`.
#[derive(Debug, Clone, Default)]
pub struct HistoryRecorder {
    records: Vec<LotteryRecord>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Its round index must be the next in sequence.
    pub fn record_round(&mut self, record: LotteryRecord) {
        debug_assert_eq!(record.round_index, self.next_round_index());
        self.records.push(record);
    }

    /// All records in round order
    pub fn list_rounds(&self) -> &[LotteryRecord] {
        &self.records
    }

    /// Record for a 1-based round index
    pub fn get(&self, round_index: u64) -> Option<&LotteryRecord> {
        let pos = usize::try_from(round_index.checked_sub(1)?).ok()?;
        self.records.get(pos)
    }

    pub fn next_round_index(&self) -> u64 {
        self.records.len() as u64 + 1
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn record(round_index: u64) -> LotteryRecord {
        LotteryRecord {
            round_index,
            timestamp: 1_000 * round_index,
            winner: Address::repeat_byte(round_index as u8),
            payout_amount: U256::from(round_index),
        }
    }

    #[test]
    fn test_records_are_one_based() {
        let mut history = HistoryRecorder::new();
        assert!(history.is_empty());
        assert_eq!(history.next_round_index(), 1);
        assert!(history.get(0).is_none());

        history.record_round(record(1));
        history.record_round(record(2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get(1), Some(&record(1)));
        assert_eq!(history.get(2), Some(&record(2)));
        assert!(history.get(0).is_none());
        assert!(history.get(3).is_none());
        assert_eq!(history.next_round_index(), 3);
    }

    #[test]
    fn test_list_rounds_in_order() {
        let mut history = HistoryRecorder::new();
        for i in 1..=3 {
            history.record_round(record(i));
        }

        let indices: Vec<u64> = history.list_rounds().iter().map(|r| r.round_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
