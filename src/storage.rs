//! Storage Engine (S): the put/remove/get/scan surface built on O using K
//! and V (§4.3). Holds all read and write protocols and their failure
//! handling.

use std::thread;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::Error;
use crate::key_codec;
use crate::seq_vector::SequenceVector;
use crate::substrate::{OrderedStore, WriteBatch};
use crate::types::{Limit, Lseq, ReplicaId, ScanEntry, ScanMode, Seq};

/// Default read-repair retry cap and back-off, exact per the system this
/// schema was distilled from (§9, §12): `kMaxReadRetryCount = 100`, 100ms
/// sleep. Overridable per-engine via [`EngineConfig`]'s own `read_retry_cap`/
/// `read_retry_backoff_ms` (§11.3).
const DEFAULT_READ_RETRY_CAP: u32 = 100;
const DEFAULT_READ_RETRY_BACKOFF: Duration = Duration::from_millis(100);

pub struct Storage<O: OrderedStore> {
    store: O,
    vector: SequenceVector,
    self_id: ReplicaId,
    read_retry_cap: u32,
    read_retry_backoff: Duration,
}

impl<O: OrderedStore> Storage<O> {
    /// Opens the engine against `store` with the default retry tunables,
    /// recovering `V` from its LSEQ-index family (§4.2, §9).
    pub fn open(store: O, self_id: ReplicaId, max_replica_id: ReplicaId) -> Result<Self, Error> {
        Self::open_with_retry(
            store,
            self_id,
            max_replica_id,
            DEFAULT_READ_RETRY_CAP,
            DEFAULT_READ_RETRY_BACKOFF,
        )
    }

    /// Opens the engine using `config`'s `self_id`/`max_replica_id` and its
    /// read-repair retry tunables (§9, §11.3), so `LSEQDB_READ_RETRY_CAP`/
    /// `LSEQDB_READ_RETRY_BACKOFF_MS` actually reach the retry loop in `get`.
    pub fn open_with_config(store: O, config: &EngineConfig) -> Result<Self, Error> {
        Self::open_with_retry(
            store,
            config.self_id,
            config.max_replica_id,
            config.read_retry_cap,
            config.read_retry_backoff(),
        )
    }

    fn open_with_retry(
        store: O,
        self_id: ReplicaId,
        max_replica_id: ReplicaId,
        read_retry_cap: u32,
        read_retry_backoff: Duration,
    ) -> Result<Self, Error> {
        let vector = SequenceVector::recover(&store, max_replica_id)?;
        Ok(Self {
            store,
            vector,
            self_id,
            read_retry_cap,
            read_retry_backoff,
        })
    }

    /// §4.3.1 local put.
    pub fn put(&self, user_key: &[u8], value: &[u8]) -> Result<Lseq, Error> {
        let current_key = key_codec::encode_current(user_key, self.self_id);
        let seq = self.store.put_sequenced(&current_key, value)?;

        let mut batch = WriteBatch::new();
        let lseq_key = key_codec::encode_lseq_index(seq, self.self_id);
        batch.put(key_codec::encode_reverse(&current_key), lseq_key.clone());
        batch.put(lseq_key, current_key.clone());
        batch.put(
            key_codec::encode_stamped(user_key, seq, self.self_id),
            value.to_vec(),
        );
        self.store.apply_batch(&batch)?;

        self.vector.observe(self.self_id, seq);
        tracing::debug!(self_id = self.self_id, seq, "put committed");
        Ok(Lseq::new(self.self_id, seq))
    }

    /// §4.3.2 local remove. The double-delete is deliberate: it ensures the
    /// LSEQ-index range no longer exposes a dangling entry for the removed
    /// key once the second delete commits.
    pub fn remove(&self, user_key: &[u8]) -> Result<Lseq, Error> {
        let current_key = key_codec::encode_current(user_key, self.self_id);
        let reverse_key = key_codec::encode_reverse(&current_key);

        let seq1 = self.store.delete_sequenced(&current_key)?;
        let lseq1_key = key_codec::encode_lseq_index(seq1, self.self_id);

        let mut batch = WriteBatch::new();
        batch.put(reverse_key, lseq1_key.clone());
        self.store.apply_batch(&batch)?;

        let seq2 = self.store.delete_sequenced(&lseq1_key)?;
        self.vector.observe(self.self_id, seq2);
        tracing::debug!(self_id = self.self_id, seq1, seq2, "remove committed");
        Ok(Lseq::new(self.self_id, seq1))
    }

    /// §4.3.3 local get. For `replica_id == self_id`, performs the
    /// read-repair retry loop; for a foreign `replica_id`, a single-shot
    /// read (no local retry race is possible, since only `B` mutates
    /// foreign data).
    pub fn get(&self, user_key: &[u8], replica_id: ReplicaId) -> Result<(Lseq, Vec<u8>), Error> {
        if replica_id != self.self_id {
            return self.get_foreign(user_key, replica_id);
        }

        let current_key = key_codec::encode_current(user_key, replica_id);
        let reverse_key = key_codec::encode_reverse(&current_key);

        for attempt in 0..self.read_retry_cap {
            let snapshot = self.store.snapshot();
            let value = match snapshot.get(&current_key)? {
                Some(value) => value,
                None => return Err(Error::NotFound),
            };
            let lseq_key = snapshot.get(&reverse_key)?;
            let echo_key = match &lseq_key {
                Some(lseq_key) => snapshot.get(lseq_key)?,
                None => None,
            };
            if echo_key.as_deref() == Some(current_key.as_slice()) {
                let lseq_key = lseq_key.expect("echo matched, so the reverse pointer must exist");
                let (replica_id, seq) = (
                    key_codec::lseq_index_replica_id(&lseq_key),
                    key_codec::lseq_index_seq(&lseq_key),
                );
                return Ok((Lseq::new(replica_id, seq), value));
            }
            tracing::warn!(attempt, "get retrying: consistency witness did not match");
            thread::sleep(self.read_retry_backoff);
        }
        Err(Error::ReadLiveLock)
    }

    fn get_foreign(&self, user_key: &[u8], replica_id: ReplicaId) -> Result<(Lseq, Vec<u8>), Error> {
        let current_key = key_codec::encode_current(user_key, replica_id);
        let snapshot = self.store.snapshot();
        let value = snapshot.get(&current_key)?.ok_or(Error::NotFound)?;
        let reverse_key = key_codec::encode_reverse(&current_key);
        let lseq_key = snapshot.get(&reverse_key)?.ok_or(Error::NotFound)?;
        let seq = key_codec::lseq_index_seq(&lseq_key);
        Ok((Lseq::new(replica_id, seq), value))
    }

    /// §4.3.4 range scan by LSEQ.
    pub fn get_by_lseq(
        &self,
        start: Lseq,
        mode: ScanMode,
        limit: Limit,
    ) -> Result<Vec<ScanEntry>, Error> {
        let start_seq = match mode {
            ScanMode::GreaterEqual => start.seq,
            ScanMode::Greater => start.seq + 1,
        };
        let start_key = key_codec::encode_lseq_index(start_seq, start.replica_id);

        let snapshot = self.store.snapshot();
        let mut results = Vec::new();
        for entry in snapshot.range_from(&start_key) {
            let (key, value) = entry?;
            if !key_codec::is_lseq_index_key(&key) {
                break;
            }
            if key_codec::lseq_index_replica_id(&key) != start.replica_id {
                break;
            }
            if let Some(limit) = limit {
                if results.len() >= limit {
                    break;
                }
            }
            let seq = key_codec::lseq_index_seq(&key);
            let current_key = value;
            let user_key = key_codec::user_key_from_current(&current_key);
            let stamped_key = key_codec::encode_stamped(user_key, seq, start.replica_id);
            let entry_value = snapshot.get(&stamped_key)?.ok_or(Error::NotFound)?;
            results.push(ScanEntry {
                lseq: Lseq::new(start.replica_id, seq),
                current_key,
                value: entry_value,
            });
        }
        Ok(results)
    }

    /// §4.3.5 range scan by user key.
    pub fn get_values_for_key(
        &self,
        user_key: &[u8],
        start_seq: Seq,
        start_replica_id: ReplicaId,
        mode: ScanMode,
        limit: Limit,
    ) -> Result<Vec<ScanEntry>, Error> {
        let seeded_seq = match mode {
            ScanMode::GreaterEqual => start_seq,
            ScanMode::Greater => start_seq + 1,
        };
        let start_key = key_codec::encode_stamped(user_key, seeded_seq, start_replica_id);

        let snapshot = self.store.snapshot();
        let mut results = Vec::new();
        for entry in snapshot.range_from(&start_key) {
            let (key, value) = entry?;
            if !key_codec::is_stamped_key(&key) {
                break;
            }
            let (found_user_key, seq, replica_id) = key_codec::parse_stamped(&key);
            if found_user_key != user_key {
                break;
            }
            if let Some(limit) = limit {
                if results.len() >= limit {
                    break;
                }
            }
            results.push(ScanEntry {
                lseq: Lseq::new(replica_id, seq),
                current_key: key_codec::encode_current(user_key, replica_id),
                value,
            });
        }
        Ok(results)
    }

    /// `getAllValuesForKey(userKey, replicaId)` is `getValuesForKey(userKey,
    /// 0, replicaId, ...)`: `replicaId` seeds the scan's start but is not a
    /// filter, since versions from every replica are returned.
    pub fn get_all_values_for_key(
        &self,
        user_key: &[u8],
        start_replica_id: ReplicaId,
        limit: Limit,
    ) -> Result<Vec<ScanEntry>, Error> {
        self.get_values_for_key(user_key, 0, start_replica_id, ScanMode::GreaterEqual, limit)
    }

    pub fn sequence_number_for_replica(&self, replica_id: ReplicaId) -> Seq {
        self.vector.read(replica_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::mem::MemStore;

    fn engine() -> Storage<MemStore> {
        Storage::open(MemStore::new(), 0, 8).unwrap()
    }

    #[test]
    fn s1_two_puts_on_different_keys() {
        let s = engine();
        let l1 = s.put(b"a", b"b").unwrap();
        let l2 = s.put(b"c", b"d").unwrap();
        assert!(l1.seq < l2.seq);
        assert_eq!(s.get(b"a", 0).unwrap(), (l1, b"b".to_vec()));
        assert_eq!(s.get(b"c", 0).unwrap(), (l2, b"d".to_vec()));
    }

    #[test]
    fn s2_put_twice_returns_latest_and_both_versions() {
        let s = engine();
        s.put(b"a2", b"b2").unwrap();
        let l2 = s.put(b"a2", b"d2").unwrap();
        let (got_lseq, got_value) = s.get(b"a2", 0).unwrap();
        assert_eq!(got_lseq, l2);
        assert_eq!(got_value, b"d2");

        let versions = s.get_values_for_key(b"a2", 0, 0, ScanMode::GreaterEqual, None).unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].value, b"b2");
        assert_eq!(versions[1].value, b"d2");
    }

    #[test]
    fn s3_put_remove_put_again() {
        let s = engine();
        let l1 = s.put(b"a3", b"b3").unwrap();
        s.remove(b"a3").unwrap();
        assert!(matches!(s.get(b"a3", 0), Err(Error::NotFound)));
        let l2 = s.put(b"a3", b"c3").unwrap();
        assert_eq!(s.get(b"a3", 0).unwrap().1, b"c3");
        assert!(l2.seq > l1.seq);
    }

    #[test]
    fn get_by_lseq_filters_by_replica_and_respects_limit_and_mode() {
        let s = engine();
        s.put(b"a", b"1").unwrap();
        s.put(b"b", b"2").unwrap();
        s.put(b"c", b"3").unwrap();

        let all = s.get_by_lseq(Lseq::new(0, 0), ScanMode::GreaterEqual, None).unwrap();
        assert_eq!(all.len(), 3);

        let first_two = s.get_by_lseq(Lseq::new(0, 0), ScanMode::GreaterEqual, Some(2)).unwrap();
        assert_eq!(first_two.len(), 2);

        let after_first = s.get_by_lseq(all[0].lseq, ScanMode::Greater, None).unwrap();
        assert_eq!(after_first.len(), 2);
        assert_eq!(after_first[0].value, b"2");
    }

    #[test]
    fn sequence_number_for_replica_tracks_local_puts() {
        let s = engine();
        assert_eq!(s.sequence_number_for_replica(0), 0);
        let l = s.put(b"k", b"v").unwrap();
        assert_eq!(s.sequence_number_for_replica(0), l.seq);
    }

    #[test]
    fn get_by_lseq_returns_the_historical_value_at_each_seq_not_the_latest() {
        let s = engine();
        let l1 = s.put(b"a", b"first").unwrap();
        s.put(b"a", b"second").unwrap();

        let from_first = s
            .get_by_lseq(l1, ScanMode::GreaterEqual, None)
            .unwrap();
        assert_eq!(from_first.len(), 2);
        assert_eq!(from_first[0].lseq, l1);
        assert_eq!(from_first[0].value, b"first");
        assert_eq!(from_first[1].value, b"second");
    }

    #[test]
    fn open_with_config_uses_configured_retry_tunables() {
        use crate::config::EngineConfig;

        let config = EngineConfig {
            self_id: 0,
            max_replica_id: 4,
            data_dir: std::path::PathBuf::from("/tmp/unused"),
            read_retry_cap: 3,
            read_retry_backoff_ms: 1,
        };
        let s = Storage::open_with_config(MemStore::new(), &config).unwrap();
        assert_eq!(s.read_retry_cap, 3);
        assert_eq!(s.read_retry_backoff, std::time::Duration::from_millis(1));
    }
}
