use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::RequestId;

/// Notifications emitted by a lottery instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum LotteryEvent {
    EnteredLottery {
        player: Address,
    },
    RequestedWinner {
        request_id: RequestId,
    },
    PickedWinner {
        winner: Address,
    },
    /// A drawing round was re-opened because its request went unanswered
    RequestExpired {
        request_id: RequestId,
    },
    /// A winner was drawn but the payout failed; the round stays drawing
    PayoutParked {
        request_id: RequestId,
        winner: Address,
        amount: U256,
    },
}

const EVENT_CAPACITY: usize = 256;

/// Fan-out of lottery events to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LotteryEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: LotteryEvent) {
        tracing::debug!(?event, "emitting lottery event");
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let player = Address::repeat_byte(0xaa);

        bus.emit(LotteryEvent::EnteredLottery { player });
        bus.emit(LotteryEvent::RequestedWinner {
            request_id: U256::from(1u64),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            LotteryEvent::EnteredLottery { player }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            LotteryEvent::RequestedWinner {
                request_id: U256::from(1u64)
            }
        );
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(LotteryEvent::PickedWinner {
            winner: Address::ZERO,
        });
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(LotteryEvent::PickedWinner {
            winner: Address::ZERO,
        })
        .unwrap();

        assert_eq!(json["event"], "PickedWinner");
    }
}
