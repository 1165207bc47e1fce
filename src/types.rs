//! Shared identifiers used across the key codec, sequence vector, storage
//! engine and batch ingest.

use std::fmt;

/// `replicaId ∈ [0, MaxReplicaId)`. The local replica's id is `selfId`.
pub type ReplicaId = u32;

/// Unsigned 64-bit sequence number, monotonic per `replicaId`. Zero means "no
/// event yet" for that replica.
pub type Seq = u64;

/// `(replicaId, seq)`, the identifier of one event in the global partial
/// order. Encoded on disk as the LSEQ-index key, which is what callers of
/// `put`/`remove`/`get_by_lseq` actually receive and pass back around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lseq {
    pub replica_id: ReplicaId,
    pub seq: Seq,
}

impl Lseq {
    pub fn new(replica_id: ReplicaId, seq: Seq) -> Self {
        Self { replica_id, seq }
    }
}

impl fmt::Display for Lseq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.replica_id, self.seq)
    }
}

/// Cut-off mode for range scans (§4.3.4, §4.3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    GreaterEqual,
    Greater,
}

/// Unbounded scans pass `limit = None`; `Some(n)` caps the result at `n`
/// entries. Mirrors the source's "negative means unbounded" convention
/// without smuggling a sentinel through an unsigned type.
pub type Limit = Option<usize>;

/// One entry returned by `get_by_lseq`/`get_values_for_key`/`get_all_values_for_key`:
/// the event's LSEQ, its current-pointer key (§3), and the value at that
/// event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub lseq: Lseq,
    pub current_key: Vec<u8>,
    pub value: Vec<u8>,
}

/// A single ingest tuple fed to `BatchIngest::put_batch` (§4.4): an event
/// produced elsewhere, identified by its LSEQ-index key and carrying the
/// current-pointer key and value it resolved to at the source replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEntry {
    pub lseq_key: Vec<u8>,
    pub current_key: Vec<u8>,
    pub value: Vec<u8>,
}
