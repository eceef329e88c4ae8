use std::collections::HashMap;

use govern_types::{Address, OwnerGuard, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RegistryError;

/// Registration state of an address. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CharityStatus {
    #[default]
    Unregistered = 0,
    Pending = 1,
    Verified = 2,
}

impl CharityStatus {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharityRecord {
    pub status: CharityStatus,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
    pub registered_at: Timestamp,
    pub verified_at: Option<Timestamp>,
}

/// Emitted when an address submits its registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registered {
    pub charity: Address,
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

/// Emitted when the owner verifies a pending registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    pub charity: Address,
}

/// Unregistered → Pending (self-service) → Verified (owner only).
#[derive(Clone, Debug)]
pub struct CharityRegistry {
    guard: OwnerGuard,
    records: HashMap<Address, CharityRecord>,
}

impl CharityRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: OwnerGuard::new(owner),
            records: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.guard.owner()
    }

    /// The caller registers itself, attaching an opaque proof.
    pub fn register(
        &mut self,
        caller: &Address,
        proof: Vec<u8>,
        now: Timestamp,
    ) -> Result<Registered, RegistryError> {
        if self.status_of(caller) != CharityStatus::Unregistered {
            return Err(RegistryError::AlreadyRegistered(*caller));
        }
        self.records.insert(
            *caller,
            CharityRecord {
                status: CharityStatus::Pending,
                proof: proof.clone(),
                registered_at: now,
                verified_at: None,
            },
        );
        info!(charity = %caller, proof_len = proof.len(), "Charity registration pending");
        Ok(Registered {
            charity: *caller,
            proof,
        })
    }

    pub fn verify(
        &mut self,
        caller: &Address,
        charity: &Address,
        now: Timestamp,
    ) -> Result<Verified, RegistryError> {
        self.guard.ensure_owner(caller)?;
        let record = self
            .records
            .get_mut(charity)
            .ok_or(RegistryError::NotRegistered(*charity))?;
        match record.status {
            CharityStatus::Pending => {}
            CharityStatus::Verified => return Err(RegistryError::AlreadyVerified(*charity)),
            CharityStatus::Unregistered => return Err(RegistryError::NotRegistered(*charity)),
        }
        record.status = CharityStatus::Verified;
        record.verified_at = Some(now);
        info!(charity = %charity, "Charity verified");
        Ok(Verified { charity: *charity })
    }

    pub fn status_of(&self, who: &Address) -> CharityStatus {
        self.records
            .get(who)
            .map(|r| r.status)
            .unwrap_or(CharityStatus::Unregistered)
    }

    pub fn record(&self, who: &Address) -> Option<&CharityRecord> {
        self.records.get(who)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let body = text.strip_prefix("0x").unwrap_or(&text);
        hex::decode(body).map_err(serde::de::Error::custom)
    }
}
