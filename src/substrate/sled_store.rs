//! `sled`-backed implementation of [`OrderedStore`] (§10).
//!
//! `sled::Tree` already iterates in byte-lex key order and commits
//! `sled::Batch`es atomically, which is exactly the substrate contract in
//! §6; the only thing this wrapper adds is the monotonic `seq` that `put`
//! and `remove` must return. `sled::Db::generate_id` hands out a
//! process-wide monotonic counter, but nothing pairs assigning an id with
//! applying the write it labels, so a write could in principle commit out of
//! id order under concurrent callers; a single mutex around "take an id,
//! then write" closes that gap.
use std::path::Path;
use std::sync::Mutex;

use crate::error::SubstrateError;
use crate::substrate::{Mutation, OrderedStore, StoreSnapshot, WriteBatch};
use crate::types::Seq;

pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    write_lock: Mutex<()>,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SubstrateError> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree("main")?;
        Ok(Self {
            db,
            tree,
            write_lock: Mutex::new(()),
        })
    }

    /// `sled::Db::generate_id()` returns 0 on a fresh database's first call,
    /// which would collide with §3's "zero means no event yet" sentinel.
    /// Offset by one so the first real event is always seq 1, matching
    /// `MemStore`'s `AtomicU64::new(1)`.
    fn next_seq(&self) -> Result<Seq, SubstrateError> {
        Ok(self.db.generate_id()? + 1)
    }
}

impl OrderedStore for SledStore {
    fn put_sequenced(&self, key: &[u8], value: &[u8]) -> Result<Seq, SubstrateError> {
        let _guard = self.write_lock.lock().expect("sled write lock poisoned");
        let seq = self.next_seq()?;
        self.tree.insert(key, value)?;
        Ok(seq)
    }

    fn delete_sequenced(&self, key: &[u8]) -> Result<Seq, SubstrateError> {
        let _guard = self.write_lock.lock().expect("sled write lock poisoned");
        let seq = self.next_seq()?;
        self.tree.remove(key)?;
        Ok(seq)
    }

    fn apply_batch(&self, batch: &WriteBatch) -> Result<(), SubstrateError> {
        let _guard = self.write_lock.lock().expect("sled write lock poisoned");
        let mut sled_batch = sled::Batch::default();
        for mutation in batch.mutations() {
            match mutation {
                Mutation::Put(key, value) => sled_batch.insert(key.as_slice(), value.as_slice()),
                Mutation::Delete(key) => sled_batch.remove(key.as_slice()),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn StoreSnapshot + '_> {
        Box::new(SledSnapshot { tree: &self.tree })
    }
}

struct SledSnapshot<'a> {
    tree: &'a sled::Tree,
}

impl<'a> StoreSnapshot for SledSnapshot<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SubstrateError> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn range_from<'b>(
        &'b self,
        start: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), SubstrateError>> + 'b> {
        Box::new(self.tree.range(start.to_vec()..).map(|entry| {
            entry
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(SubstrateError::from)
        }))
    }
}
