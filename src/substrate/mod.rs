//! The ordered KV substrate (O), abstracted behind a trait so the storage
//! engine and batch ingest (§4.3, §4.4) are written once against any backend
//! that can satisfy the substrate contract in §6: sequenced single-key
//! writes, atomic multi-key batches, and snapshot-bound ordered iteration.
//!
//! `sled` backs the production implementation ([`SledStore`]); an in-process
//! `BTreeMap` ([`mem::MemStore`]) stands in for tests.

#[cfg(any(test, feature = "test-utils"))]
pub mod mem;
pub mod sled_store;

pub use sled_store::SledStore;

use crate::error::SubstrateError;
use crate::types::Seq;

/// One mutation staged into a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// A set of mutations applied to O atomically (§4.3.1 step 3, §4.4 step 2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.mutations.push(Mutation::Put(key.into(), value.into()));
        self
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.mutations.push(Mutation::Delete(key.into()));
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// The ordered KV substrate contract required by §6:
///
/// - `put_sequenced`/`delete_sequenced` apply a single-key mutation and
///   return the process-wide-monotonic `seq` assigned to it, with the
///   guarantee that earlier calls observed smaller `seq`s.
/// - `apply_batch` commits a [`WriteBatch`] atomically.
/// - `snapshot` opens a read view bound to one point in time, used for the
///   read-repair loop (4.3.3) and range scans (4.3.4, 4.3.5).
///
/// Ordered iteration is byte-lexicographic; per §6 that alone is enough for
/// every family, including the numeric-looking `#` family, because the
/// zero-padded encoding makes lex and numeric order coincide.
pub trait OrderedStore: Send + Sync {
    fn put_sequenced(&self, key: &[u8], value: &[u8]) -> Result<Seq, SubstrateError>;

    fn delete_sequenced(&self, key: &[u8]) -> Result<Seq, SubstrateError>;

    fn apply_batch(&self, batch: &WriteBatch) -> Result<(), SubstrateError>;

    fn snapshot(&self) -> Box<dyn StoreSnapshot + '_>;
}

/// A read-only, point-in-time view over O.
pub trait StoreSnapshot {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SubstrateError>;

    /// Ordered iteration starting at `start` (inclusive), in byte-lex key
    /// order, bound to this snapshot.
    fn range_from<'a>(
        &'a self,
        start: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), SubstrateError>> + 'a>;
}
