//! Identifier allocation across store restarts.

use linkstore::config::{BackendKind, IdStrategy};
use linkstore::ids::encoding::{decode_id, encode_id};
use linkstore::store::open_store;

mod common;
use common::{route, storage_config};

const DURABLE: &[IdStrategy] = &[
    IdStrategy::Batched,
    IdStrategy::PerCall,
    IdStrategy::Transactional,
];

fn allocate(n: usize, dir: &std::path::Path, strategy: IdStrategy, close: bool) -> Vec<u64> {
    let store = open_store(&storage_config(dir, BackendKind::Embedded, strategy)).unwrap();
    let ids = (0..n).map(|_| store.next_id().unwrap()).collect();
    if close {
        store.close().unwrap();
    }
    ids
}

#[test]
fn test_clean_restart_never_reuses_ids() {
    for strategy in DURABLE {
        let dir = tempfile::tempdir().unwrap();
        let first = allocate(501, dir.path(), *strategy, true);
        assert_eq!(first.first(), Some(&1));
        assert_eq!(first.last(), Some(&501));

        let second = allocate(3, dir.path(), *strategy, true);
        assert_eq!(second, vec![502, 503, 504], "strategy {:?}", strategy);
    }
}

#[test]
fn test_crash_restart_never_reuses_ids() {
    for strategy in DURABLE {
        let dir = tempfile::tempdir().unwrap();
        let first = allocate(501, dir.path(), *strategy, false);
        let max = *first.iter().max().unwrap();

        let second = allocate(1, dir.path(), *strategy, false);
        assert!(second[0] > max, "strategy {:?} reused an id", strategy);
    }
}

#[test]
fn test_batched_crash_skips_to_next_batch() {
    let dir = tempfile::tempdir().unwrap();
    allocate(501, dir.path(), IdStrategy::Batched, false);
    // batch size 100: the ceiling after 501 ids is 600
    assert_eq!(allocate(1, dir.path(), IdStrategy::Batched, false), vec![601]);
}

#[test]
fn test_generated_names_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = storage_config(dir.path(), BackendKind::Embedded, IdStrategy::Batched);

    let name = {
        let store = open_store(&config).unwrap();
        let name = encode_id(store.next_id().unwrap());
        store.put(&route(&name, "https://generated.example.com")).unwrap();
        store.close().unwrap();
        name
    };

    let store = open_store(&config).unwrap();
    let stored = store.get(&name).unwrap().unwrap();
    assert_eq!(stored.url, "https://generated.example.com");

    let next = encode_id(store.next_id().unwrap());
    assert!(decode_id(&next).unwrap() > decode_id(&name).unwrap());
}
