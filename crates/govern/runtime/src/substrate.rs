use std::collections::HashMap;

use govern_types::{Address, Amount, LedgerError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Native currency balances held by the execution substrate.
///
/// Value attached to a call moves from the caller to the callee before the
/// callee runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NativeBank {
    balances: HashMap<Address, Amount>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, who: &Address) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Overwrite `who`'s balance. Used to fund accounts in local runs.
    pub fn set_balance(&mut self, who: &Address, amount: Amount) {
        self.balances.insert(*who, amount);
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: *from,
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("native balance of {}", to)))?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        debug!(from = %from, to = %to, amount = amount, "Native value moved");
        Ok(())
    }
}
