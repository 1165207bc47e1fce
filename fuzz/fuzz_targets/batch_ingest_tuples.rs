#![no_main]

// Harness: batch_ingest_tuples
// Feeds arbitrary (seq, replica, key, value) tuples through BatchIngest and
// checks P4/P5: sequenceNumberForReplica lands on the max ingested seq per
// replica, and every ingested (key, replica) resolves to its value.

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lseqdb::key_codec::{encode_current, encode_lseq_index};
use lseqdb::seq_vector::SequenceVector;
use lseqdb::substrate::mem::MemStore;
use lseqdb::{BatchIngest, IngestEntry, Storage};

const MAX_REPLICA_ID: u32 = 8;

#[derive(Arbitrary, Debug, Clone)]
struct Tuple {
    seq: u64,
    replica_id: u8,
    key: Vec<u8>,
    value: Vec<u8>,
}

fuzz_target!(|tuples: Vec<Tuple>| {
    let store = MemStore::new();
    let vector = SequenceVector::recover(&store, MAX_REPLICA_ID).unwrap();
    let ingest = BatchIngest::new(&store, &vector);

    let mut expected_max: HashMap<u32, u64> = HashMap::new();
    let mut expected_value: HashMap<(u32, Vec<u8>), Vec<u8>> = HashMap::new();
    let mut entries = Vec::new();

    for tuple in tuples.into_iter().take(200) {
        let replica_id = tuple.replica_id as u32 % MAX_REPLICA_ID;
        entries.push(IngestEntry {
            lseq_key: encode_lseq_index(tuple.seq, replica_id),
            current_key: encode_current(&tuple.key, replica_id),
            value: tuple.value.clone(),
        });
        expected_max
            .entry(replica_id)
            .and_modify(|max| *max = (*max).max(tuple.seq))
            .or_insert(tuple.seq);
        expected_value.insert((replica_id, tuple.key), tuple.value);
    }

    if entries.is_empty() {
        return;
    }
    ingest.put_batch(&entries).unwrap();

    for (replica_id, max_seq) in &expected_max {
        assert_eq!(vector.read(*replica_id), *max_seq);
    }

    let storage = Storage::open(store, 0, MAX_REPLICA_ID).unwrap();
    for ((replica_id, key), value) in &expected_value {
        let (_, got) = storage.get(key, *replica_id).unwrap();
        assert_eq!(&got, value);
    }
});
