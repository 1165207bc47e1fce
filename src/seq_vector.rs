//! In-memory vector of atomic per-replica sequence counters (§4.2).
//!
//! `V` is the only mutable shared state in the core besides the substrate
//! itself; every mutation goes through a CAS loop so readers never see a
//! value lower than one already observed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SubstrateError;
use crate::key_codec;
use crate::substrate::OrderedStore;
use crate::types::{ReplicaId, Seq};

pub struct SequenceVector {
    counters: Vec<AtomicU64>,
}

impl SequenceVector {
    /// Builds a zeroed vector sized to `max_replica_id`.
    pub fn new(max_replica_id: ReplicaId) -> Self {
        let counters = (0..max_replica_id).map(|_| AtomicU64::new(0)).collect();
        Self { counters }
    }

    /// Raises `V[replica_id]` to `max(V[replica_id], seq)`. Never lowers.
    pub fn observe(&self, replica_id: ReplicaId, seq: Seq) {
        let slot = &self.counters[replica_id as usize];
        let mut current = slot.load(Ordering::Acquire);
        while current < seq {
            match slot.compare_exchange_weak(
                current,
                seq,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// Acquire-load of `V[replica_id]`.
    pub fn read(&self, replica_id: ReplicaId) -> Seq {
        self.counters[replica_id as usize].load(Ordering::Acquire)
    }

    /// Scans the LSEQ-index family of `store` once at startup, per replica,
    /// to recover the highest sequence already applied to the substrate
    /// (§4.2, §9). The scan stops at the first key whose family byte is not
    /// `#`, or whose parsed replica-id differs from the one being recovered
    /// — both tests are required, since the `#` family holds every replica
    /// contiguously and higher replica-ids sort as later keys.
    pub fn recover<O: OrderedStore>(
        store: &O,
        max_replica_id: ReplicaId,
    ) -> Result<Self, SubstrateError> {
        let vector = Self::new(max_replica_id);
        let snapshot = store.snapshot();
        for replica_id in 0..max_replica_id {
            let start = key_codec::encode_lseq_index(0, replica_id);
            let mut last_seq = 0;
            for entry in snapshot.range_from(&start) {
                let (key, _value) = entry?;
                if !key_codec::is_lseq_index_key(&key) {
                    break;
                }
                if key_codec::lseq_index_replica_id(&key) != replica_id {
                    break;
                }
                last_seq = key_codec::lseq_index_seq(&key);
            }
            vector.counters[replica_id as usize].store(last_seq, Ordering::Release);
            tracing::debug!(replica_id, last_seq, "recovered sequence vector slot");
        }
        Ok(vector)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
