use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::errors::PaymentError;

/// Transfers pooled funds to a winner and reports the outcome synchronously.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRail: Send + Sync {
    async fn pay(&self, to: Address, amount: U256) -> Result<(), PaymentError>;
}

/// Payment rail that credits balances in memory. Accounts can be marked as
/// rejecting to simulate a destination that refuses transfers.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRail {
    balances: Mutex<HashMap<Address, U256>>,
    rejecting: Mutex<HashSet<Address>>,
}

impl InMemoryPaymentRail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances
            .lock()
            .map(|balances| balances.get(account).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn reject(&self, account: Address) {
        if let Ok(mut rejecting) = self.rejecting.lock() {
            rejecting.insert(account);
        }
    }

    pub fn accept(&self, account: &Address) {
        if let Ok(mut rejecting) = self.rejecting.lock() {
            rejecting.remove(account);
        }
    }
}

#[async_trait]
impl PaymentRail for InMemoryPaymentRail {
    async fn pay(&self, to: Address, amount: U256) -> Result<(), PaymentError> {
        let rejected = self
            .rejecting
            .lock()
            .map_err(|_| PaymentError::Unreachable("rejection list poisoned".to_string()))?
            .contains(&to);
        if rejected {
            return Err(PaymentError::Rejected(to));
        }

        let mut balances = self
            .balances
            .lock()
            .map_err(|_| PaymentError::Unreachable("balance store poisoned".to_string()))?;
        let balance = balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }
}
