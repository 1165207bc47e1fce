//! In-process ordered KV substrate backed by a `BTreeMap`, gated behind
//! `test-utils`. Gives the property tests a deterministic O without paying
//! for real disk I/O or depending on sled's exact fsync/compaction timing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::SubstrateError;
use crate::substrate::{Mutation, OrderedStore, StoreSnapshot, WriteBatch};
use crate::types::Seq;

pub struct MemStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    next_seq: AtomicU64,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    fn next(&self) -> Seq {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedStore for MemStore {
    fn put_sequenced(&self, key: &[u8], value: &[u8]) -> Result<Seq, SubstrateError> {
        let seq = self.next();
        self.data
            .lock()
            .expect("mem store mutex poisoned")
            .insert(key.to_vec(), value.to_vec());
        Ok(seq)
    }

    fn delete_sequenced(&self, key: &[u8]) -> Result<Seq, SubstrateError> {
        let seq = self.next();
        self.data.lock().expect("mem store mutex poisoned").remove(key);
        Ok(seq)
    }

    fn apply_batch(&self, batch: &WriteBatch) -> Result<(), SubstrateError> {
        let mut guard = self.data.lock().expect("mem store mutex poisoned");
        for mutation in batch.mutations() {
            match mutation {
                Mutation::Put(key, value) => {
                    guard.insert(key.clone(), value.clone());
                }
                Mutation::Delete(key) => {
                    guard.remove(key);
                }
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn StoreSnapshot + '_> {
        let snapshot = self.data.lock().expect("mem store mutex poisoned").clone();
        Box::new(MemSnapshot { snapshot })
    }
}

struct MemSnapshot {
    snapshot: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl StoreSnapshot for MemSnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SubstrateError> {
        Ok(self.snapshot.get(key).cloned())
    }

    fn range_from<'a>(
        &'a self,
        start: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), SubstrateError>> + 'a> {
        let start = start.to_vec();
        Box::new(
            self.snapshot
                .range(start..)
                .map(|(k, v)| Ok((k.clone(), v.clone()))),
        )
    }
}
