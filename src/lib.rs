#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//! A replicated key/value storage core: every local write receives a
//! monotonic per-replica logical sequence number (LSEQ), and replicas
//! converge by exchanging ranges of each other's LSEQ-ordered event logs.
//!
//! This crate is the local storage engine layered on top of an ordered
//! embedded key/value store ([`substrate`]): the key-schema design
//! ([`key_codec`]) that simultaneously supports point reads of the latest
//! value for a user key within a given replica, range scans by LSEQ, range
//! scans by user-key across the full version history of that key, and safe
//! ingestion of batches originating at foreign replicas ([`batch_ingest`])
//! without corrupting local sequence counters ([`seq_vector`]).

pub mod batch_ingest;
pub mod config;
pub mod error;
pub mod key_codec;
pub mod seq_vector;
pub mod storage;
pub mod substrate;
pub mod types;

pub use batch_ingest::{BatchIngest, ReplicaLocks};
pub use config::EngineConfig;
pub use error::{Error, SubstrateError};
pub use storage::Storage;
pub use substrate::{Mutation, OrderedStore, SledStore, StoreSnapshot, WriteBatch};
pub use types::{IngestEntry, Limit, Lseq, ReplicaId, ScanEntry, ScanMode, Seq};