//! Append-only, hash-chained audit ledger.
//!
//! Every significant action during a run is recorded as a [`LedgerEntry`]
//! whose `hash_signature` is a SHA-256 over the entry's own fields plus the
//! previous entry's signature. Entry 0 chains from the run's chain seed (the
//! run id). Any mutation or reordering of a recorded entry invalidates every
//! subsequent signature, which [`verify_chain`] detects.
//!
//! # Canonical hash input
//!
//! The chain must be reproducible across implementations, so the preimage is
//! fixed exactly:
//!
//! ```text
//! "{timestamp}:{module}:{action}:{smart_id}:{contract_id}:{previous_signature}"
//! ```
//!
//! with the timestamp in decimal milliseconds, literal `:` separators, and
//! the signature rendered as lowercase hex. This byte layout is the one piece
//! of wire compatibility that must be preserved if entries are ever
//! persisted.

use crate::core::time::{SimClock, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// One tamper-evident ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Deterministic id: `led_{seq:06}_{sig[..8]}`.
    pub id: String,
    pub timestamp: Timestamp,
    /// Module that reported the action.
    pub module: String,
    /// What was done (`validation_passed`, `run_aborted`, ...).
    pub action: String,
    /// Operator identity the action is attributed to.
    pub smart_id: String,
    pub contract_id: String,
    /// SHA-256 over this entry's canonical fields and the prior signature.
    pub hash_signature: String,
}

/// Compute the chained signature for one entry's fields.
pub fn compute_signature(
    timestamp: Timestamp,
    module: &str,
    action: &str,
    smart_id: &str,
    contract_id: &str,
    previous_signature: &str,
) -> String {
    let preimage = format!(
        "{}:{}:{}:{}:{}:{}",
        timestamp, module, action, smart_id, contract_id, previous_signature
    );
    let digest = Sha256::digest(preimage.as_bytes());
    format!("{:x}", digest)
}

/// Writes sequential, hash-chained entries for one run.
///
/// Append-only: the writer holds only the last signature and a sequence
/// counter; entries, once produced, are never revisited.
#[derive(Debug)]
pub struct LedgerWriter {
    seq: usize,
    prev_signature: String,
}

impl LedgerWriter {
    /// Start a chain from `chain_seed` (the run id).
    pub fn new(chain_seed: &str) -> Self {
        Self {
            seq: 0,
            prev_signature: chain_seed.to_string(),
        }
    }

    /// Append the next entry; write order fixes chain order.
    pub fn append(
        &mut self,
        clock: &mut SimClock,
        module: &str,
        action: &str,
        smart_id: &str,
        contract_id: &str,
    ) -> LedgerEntry {
        let timestamp = clock.now();
        let signature = compute_signature(
            timestamp,
            module,
            action,
            smart_id,
            contract_id,
            &self.prev_signature,
        );
        let entry = LedgerEntry {
            id: format!("led_{:06}_{}", self.seq, &signature[..8]),
            timestamp,
            module: module.to_string(),
            action: action.to_string(),
            smart_id: smart_id.to_string(),
            contract_id: contract_id.to_string(),
            hash_signature: signature.clone(),
        };
        self.seq += 1;
        self.prev_signature = signature;
        entry
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.seq
    }

    pub fn is_empty(&self) -> bool {
        self.seq == 0
    }

    /// Signature the next entry will chain from.
    pub fn head_signature(&self) -> &str {
        &self.prev_signature
    }
}

/// Ledger verification failure: the stored signature at `index` does not
/// match the recomputed chain. Never silently repaired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "ledger integrity violation at entry {index} ({entry_id}): \
     expected signature {expected}, found {actual}"
)]
pub struct IntegrityError {
    pub index: usize,
    pub entry_id: String,
    pub expected: String,
    pub actual: String,
}

/// Recompute every signature from `chain_seed` and compare against the
/// stored ones. Returns the first mismatch.
pub fn verify_chain(entries: &[LedgerEntry], chain_seed: &str) -> Result<(), IntegrityError> {
    let mut prev = chain_seed.to_string();
    for (index, entry) in entries.iter().enumerate() {
        let expected = compute_signature(
            entry.timestamp,
            &entry.module,
            &entry.action,
            &entry.smart_id,
            &entry.contract_id,
            &prev,
        );
        if expected != entry.hash_signature {
            return Err(IntegrityError {
                index,
                entry_id: entry.id.clone(),
                expected,
                actual: entry.hash_signature.clone(),
            });
        }
        prev = expected;
    }
    Ok(())
}
