//! Batch Ingest (B): the foreign-batch applier used when peer events arrive
//! (§4.4). Shares invariants with S but is serialized per originating
//! replica — see [`ReplicaLocks`].

use std::sync::Mutex;

use crate::error::Error;
use crate::key_codec;
use crate::seq_vector::SequenceVector;
use crate::substrate::{OrderedStore, WriteBatch};
use crate::types::{IngestEntry, ReplicaId};

pub struct BatchIngest<'a, O: OrderedStore> {
    store: &'a O,
    vector: &'a SequenceVector,
}

impl<'a, O: OrderedStore> BatchIngest<'a, O> {
    pub fn new(store: &'a O, vector: &'a SequenceVector) -> Self {
        Self { store, vector }
    }

    /// Applies `entries`, all produced elsewhere, as one atomic write-batch.
    /// `B` is explicitly unsafe against untrusted input: it blindly
    /// overwrites local current-pointers. Callers must ensure entries come
    /// from an authenticated peer and pertain to a `replicaId != selfId`,
    /// and must hold that replica's slot in a [`ReplicaLocks`] for the
    /// duration of the call.
    pub fn put_batch(&self, entries: &[IngestEntry]) -> Result<(), Error> {
        let mut batch = WriteBatch::new();
        let mut observations: Vec<(ReplicaId, u64)> = Vec::with_capacity(entries.len());

        for entry in entries {
            let (replica_id, seq) = (
                key_codec::lseq_index_replica_id(&entry.lseq_key),
                key_codec::lseq_index_seq(&entry.lseq_key),
            );
            let user_key = key_codec::user_key_from_current(&entry.current_key);

            batch.put(entry.lseq_key.clone(), entry.current_key.clone());
            batch.put(entry.current_key.clone(), entry.value.clone());
            batch.put(
                key_codec::encode_reverse(&entry.current_key),
                entry.lseq_key.clone(),
            );
            batch.put(
                key_codec::encode_stamped(user_key, seq, replica_id),
                entry.value.clone(),
            );
            observations.push((replica_id, seq));
        }

        self.store.apply_batch(&batch)?;

        for (replica_id, seq) in observations {
            self.vector.observe(replica_id, seq);
        }
        tracing::debug!(count = entries.len(), "batch ingested");
        Ok(())
    }
}

/// One mutex per source-replica: the caller acquires `locks.slot(replica_id)`
/// before calling [`BatchIngest::put_batch`] for that replica, guaranteeing
/// in-order, non-overlapping application of batches from a given peer while
/// batches from different peers proceed in parallel.
pub struct ReplicaLocks {
    locks: Vec<Mutex<()>>,
}

impl ReplicaLocks {
    pub fn new(max_replica_id: ReplicaId) -> Self {
        let locks = (0..max_replica_id).map(|_| Mutex::new(())).collect();
        Self { locks }
    }

    pub fn slot(&self, replica_id: ReplicaId) -> &Mutex<()> {
        &self.locks[replica_id as usize]
    }
}
