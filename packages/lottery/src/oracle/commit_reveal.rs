use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{keccak256, B256, U256};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::random_derivation::{commitment, RandomDerivation};
use super::RandomnessOracle;
use crate::errors::LotteryError;
use crate::types::{Fulfillment, OracleRequestParams, RequestId};

/// Commitments kept for verification by default
pub const DEFAULT_RETAINED_COMMITMENTS: usize = 1024;

/// Commitments of the most recent requests, oldest evicted first
struct CommitmentLog {
    by_id: HashMap<RequestId, B256>,
    order: VecDeque<RequestId>,
    capacity: usize,
}

impl CommitmentLog {
    fn new(capacity: usize) -> Self {
        Self {
            by_id: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn insert(&mut self, request_id: RequestId, commitment: B256) {
        if self.by_id.insert(request_id, commitment).is_none() {
            self.order.push_back(request_id);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.by_id.remove(&oldest);
            }
        }
    }
}

/// Commit-reveal randomness provider.
///
/// Each request draws a fresh 32-byte seed and publishes `keccak256(seed)` as
/// its commitment. After `reveal_delay` the seed is revealed together with the
/// words derived from `seed || request_id`, so any observer holding the
/// commitment can check the words with [`verify_reveal`].
pub struct CommitRevealOracle {
    secret: B256,
    nonce: AtomicU64,
    commitments: Mutex<CommitmentLog>,
    fulfillments: mpsc::UnboundedSender<Fulfillment>,
    reveal_delay: Duration,
}

impl CommitRevealOracle {
    /// Create the provider and the receiving end of its callback channel.
    /// `secret` only seeds request ids; it never influences the words.
    pub fn new(
        secret: B256,
        reveal_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Fulfillment>) {
        Self::with_retention(secret, reveal_delay, DEFAULT_RETAINED_COMMITMENTS)
    }

    /// Like [`CommitRevealOracle::new`], keeping only the commitments of the
    /// `retained` most recent requests.
    pub fn with_retention(
        secret: B256,
        reveal_delay: Duration,
        retained: usize,
    ) -> (Self, mpsc::UnboundedReceiver<Fulfillment>) {
        let (fulfillments, rx) = mpsc::unbounded_channel();
        let oracle = Self {
            secret,
            nonce: AtomicU64::new(0),
            commitments: Mutex::new(CommitmentLog::new(retained.max(1))),
            fulfillments,
            reveal_delay,
        };
        (oracle, rx)
    }

    /// Commitment published for a request, if the request was issued here
    pub fn commitment(&self, request_id: &RequestId) -> Option<B256> {
        self.commitments.lock().ok()?.by_id.get(request_id).copied()
    }

    /// Check a fulfillment against the commitment recorded for its request
    pub fn verify(&self, fulfillment: &Fulfillment) -> bool {
        match self.commitment(&fulfillment.request_id) {
            Some(commitment) => verify_reveal(&commitment, fulfillment),
            None => false,
        }
    }

    fn next_request_id(&self) -> RequestId {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut data = self.secret.as_slice().to_vec();
        data.extend_from_slice(&nonce.to_be_bytes());
        U256::from_be_bytes(keccak256(&data).0)
    }
}

#[async_trait]
impl RandomnessOracle for CommitRevealOracle {
    async fn request_random_words(
        &self,
        params: &OracleRequestParams,
    ) -> Result<RequestId, LotteryError> {
        if params.num_words == 0 {
            return Err(LotteryError::Oracle(
                "request must ask for at least one word".to_string(),
            ));
        }

        let request_id = self.next_request_id();
        let seed = B256::from(rand::random::<[u8; 32]>());
        let committed = commitment(&seed);

        self.commitments
            .lock()
            .map_err(|_| LotteryError::Oracle("commitment store poisoned".to_string()))?
            .insert(request_id, committed);

        info!(
            request_id = %request_id,
            commitment = %committed,
            subscription_id = params.subscription_id,
            confirmations = params.request_confirmations,
            "randomness requested"
        );

        let fulfillment = Fulfillment {
            request_id,
            random_words: derive_words(&seed, &request_id, params.num_words),
            proof: seed,
        };

        if self.reveal_delay.is_zero() {
            if self.fulfillments.send(fulfillment).is_err() {
                warn!(request_id = %request_id, "fulfillment channel closed");
            }
        } else {
            let sender = self.fulfillments.clone();
            let delay = self.reveal_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!(request_id = %request_id, "revealing randomness");
                if sender.send(fulfillment).is_err() {
                    warn!(request_id = %request_id, "fulfillment channel closed");
                }
            });
        }

        Ok(request_id)
    }
}

fn derive_words(seed: &B256, request_id: &RequestId, count: u32) -> Vec<U256> {
    let id_bytes = request_id.to_be_bytes::<32>();
    RandomDerivation::from_sources(&[seed.as_slice(), id_bytes.as_slice()]).words(count)
}

/// Check that a fulfillment reveals the seed behind `commitment` and carries
/// exactly the words that seed derives for its request.
pub fn verify_reveal(commitment_hash: &B256, fulfillment: &Fulfillment) -> bool {
    if commitment(&fulfillment.proof) != *commitment_hash {
        return false;
    }

    let expected = derive_words(
        &fulfillment.proof,
        &fulfillment.request_id,
        fulfillment.random_words.len() as u32,
    );
    !expected.is_empty() && expected == fulfillment.random_words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_words: u32) -> OracleRequestParams {
        OracleRequestParams {
            num_words,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_request_delivers_one_verifiable_fulfillment() {
        let (oracle, mut rx) = CommitRevealOracle::new(B256::from([7u8; 32]), Duration::ZERO);

        let request_id = oracle.request_random_words(&params(1)).await.unwrap();
        let fulfillment = rx.recv().await.unwrap();

        assert_eq!(fulfillment.request_id, request_id);
        assert_eq!(fulfillment.random_words.len(), 1);
        assert!(oracle.verify(&fulfillment));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_ids_are_fresh() {
        let (oracle, _rx) = CommitRevealOracle::new(B256::from([7u8; 32]), Duration::ZERO);

        let first = oracle.request_random_words(&params(1)).await.unwrap();
        let second = oracle.request_random_words(&params(1)).await.unwrap();

        assert_ne!(first, second);
        assert!(oracle.commitment(&first).is_some());
        assert!(oracle.commitment(&second).is_some());
    }

    #[tokio::test]
    async fn test_tampered_fulfillment_fails_verification() {
        let (oracle, mut rx) = CommitRevealOracle::new(B256::from([7u8; 32]), Duration::ZERO);
        oracle.request_random_words(&params(2)).await.unwrap();
        let fulfillment = rx.recv().await.unwrap();

        let mut wrong_word = fulfillment.clone();
        wrong_word.random_words[0] = U256::from(7u64);
        assert!(!oracle.verify(&wrong_word));

        let mut wrong_seed = fulfillment.clone();
        wrong_seed.proof = B256::ZERO;
        assert!(!oracle.verify(&wrong_seed));

        let mut unknown = fulfillment;
        unknown.request_id = U256::from(1u64);
        assert!(!oracle.verify(&unknown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_reveal() {
        let (oracle, mut rx) =
            CommitRevealOracle::new(B256::from([7u8; 32]), Duration::from_secs(30));

        let request_id = oracle.request_random_words(&params(1)).await.unwrap();
        assert!(rx.try_recv().is_err());

        let fulfillment = rx.recv().await.unwrap();
        assert_eq!(fulfillment.request_id, request_id);
    }

    #[tokio::test]
    async fn test_old_commitments_are_evicted() {
        let (oracle, _rx) =
            CommitRevealOracle::with_retention(B256::from([7u8; 32]), Duration::ZERO, 2);

        let first = oracle.request_random_words(&params(1)).await.unwrap();
        let second = oracle.request_random_words(&params(1)).await.unwrap();
        let third = oracle.request_random_words(&params(1)).await.unwrap();

        assert!(oracle.commitment(&first).is_none());
        assert!(oracle.commitment(&second).is_some());
        assert!(oracle.commitment(&third).is_some());
    }

    #[tokio::test]
    async fn test_zero_words_rejected() {
        let (oracle, _rx) = CommitRevealOracle::new(B256::ZERO, Duration::ZERO);
        assert!(matches!(
            oracle.request_random_words(&params(0)).await,
            Err(LotteryError::Oracle(_))
        ));
    }
}
