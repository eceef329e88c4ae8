use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::time::Timestamp;
use crate::Amount;

/// Facts about the external call currently executing.
///
/// Supplied by the execution substrate; `now` is read once per call so every
/// timestamp an operation writes derives from the same reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
    /// Native currency attached to the call.
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self {
            caller,
            now,
            value: 0,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}
