//! Integration tests for the linear-probe hash table.
//!
//! Covers the table-backed instantiation (`GenericKey` -> `RecordId`),
//! persistence through a file-backed pool, and concurrent access to
//! distinct buckets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use stratum::heap::RecordId;
use stratum::index::{GenericKey, LinearProbeHashTable};
use stratum::storage::{
    BufferPoolConfig, BufferPoolManager, ClockReplacer, DiskManager, FileDiskManager,
    MemoryDiskManager, PageId,
};
use tempfile::tempdir;

fn pool_with<D: DiskManager>(disk: D, pool_size: usize) -> Arc<BufferPoolManager<D>> {
    Arc::new(BufferPoolManager::new(
        disk,
        ClockReplacer::new(pool_size),
        BufferPoolConfig { pool_size },
    ))
}

fn sip_hash(key: &GenericKey<8>) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_generic_key_record_id_instantiation() {
    let pool = pool_with(MemoryDiskManager::new(), 32);
    let table =
        LinearProbeHashTable::<GenericKey<8>, RecordId, _, _>::create(pool, 16, sip_hash).unwrap();

    let key = |name: &str| GenericKey::<8>::from_bytes(name.as_bytes());

    let rid_a = RecordId::new(PageId::new(3), 0);
    let rid_b = RecordId::new(PageId::new(3), 1);
    assert!(table.insert(&key("alice"), &rid_a).unwrap());
    assert!(table.insert(&key("alice"), &rid_b).unwrap());
    assert!(table.insert(&key("bob"), &rid_a).unwrap());

    let mut alice = table.get(&key("alice")).unwrap();
    alice.sort_by_key(|rid| rid.slot_id);
    assert_eq!(alice, vec![rid_a, rid_b]);
    assert_eq!(table.get(&key("bob")).unwrap(), vec![rid_a]);
    assert!(table.get(&key("carol")).unwrap().is_empty());

    assert!(table.remove(&key("alice"), &rid_a).unwrap());
    assert_eq!(table.get(&key("alice")).unwrap(), vec![rid_b]);
}

#[test]
fn test_insert_get_remove_laws() {
    let pool = pool_with(MemoryDiskManager::new(), 32);
    let table =
        LinearProbeHashTable::<GenericKey<8>, RecordId, _, _>::create(pool, 8, sip_hash).unwrap();

    let key = GenericKey::<8>::from_bytes(b"law");
    let rid = RecordId::new(PageId::new(9), 4);

    // insert then get includes the value
    assert!(table.insert(&key, &rid).unwrap());
    assert!(table.get(&key).unwrap().contains(&rid));

    // a second identical insert fails
    assert!(!table.insert(&key, &rid).unwrap());

    // remove then get excludes the value
    assert!(table.remove(&key, &rid).unwrap());
    assert!(!table.get(&key).unwrap().contains(&rid));
}

#[test]
fn test_survives_pool_smaller_than_buckets() {
    // 16 block pages + header through a 4-frame pool: every operation
    // faults its bucket in and out of the pool.
    let pool = pool_with(MemoryDiskManager::new(), 4);
    let table =
        LinearProbeHashTable::<GenericKey<8>, RecordId, _, _>::create(pool, 16, sip_hash).unwrap();

    let mut expected = Vec::new();
    for i in 0..200u64 {
        let key = GenericKey::<8>::from_bytes(&i.to_le_bytes());
        let rid = RecordId::new(PageId::new(i), (i % 100) as u16);
        assert!(table.insert(&key, &rid).unwrap());
        expected.push((key, rid));
    }

    for (key, rid) in &expected {
        assert_eq!(table.get(key).unwrap(), vec![*rid]);
    }
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.db");

    let header_page_id = {
        let pool = pool_with(FileDiskManager::open(&path).unwrap(), 16);
        let table = LinearProbeHashTable::<GenericKey<8>, RecordId, _, _>::create(
            Arc::clone(&pool),
            8,
            sip_hash,
        )
        .unwrap();

        for i in 0..50u64 {
            let key = GenericKey::<8>::from_bytes(&i.to_le_bytes());
            assert!(table.insert(&key, &RecordId::new(PageId::new(i), 0)).unwrap());
        }

        pool.flush_all().unwrap();
        table.header_page_id()
    };
    // Pool dropped, file closed.

    let pool = pool_with(FileDiskManager::open(&path).unwrap(), 16);
    let table =
        LinearProbeHashTable::<GenericKey<8>, RecordId, _, _>::open(pool, header_page_id, sip_hash)
            .unwrap();

    assert_eq!(table.size(), 8);
    for i in 0..50u64 {
        let key = GenericKey::<8>::from_bytes(&i.to_le_bytes());
        assert_eq!(table.get(&key).unwrap(), vec![RecordId::new(PageId::new(i), 0)]);
    }
}

#[test]
fn test_concurrent_distinct_buckets() {
    let pool = pool_with(MemoryDiskManager::new(), 32);
    // Identity hash: key k lands in bucket k % 16, so each thread owns its
    // buckets and writers never collide on a bucket.
    let table = Arc::new(
        LinearProbeHashTable::<u64, u64, _, _>::create(pool, 16, |k: &u64| *k).unwrap(),
    );

    let mut handles = vec![];
    for t in 0..4u64 {
        let table = Arc::clone(&table);
        handles.push(std::thread::spawn(move || {
            for round in 0..50u64 {
                let key = t * 4 + (round % 4) * 16;
                assert!(table.insert(&key, &round).unwrap());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4u64 {
        for slot in 0..4u64 {
            let key = t * 4 + slot * 16;
            let values = table.get(&key).unwrap();
            // Key `slot` received every round with round % 4 == slot.
            let expected = 50 / 4 + if slot < 50 % 4 { 1 } else { 0 };
            assert_eq!(values.len(), expected as usize);
        }
    }
}

#[test]
fn test_randomized_against_model() {
    // Random inserts and removes mirrored into an in-memory model.
    let pool = pool_with(MemoryDiskManager::new(), 16);
    let table = LinearProbeHashTable::<u64, u64, _, _>::create(pool, 8, |k: &u64| {
        let mut hasher = DefaultHasher::new();
        k.hash(&mut hasher);
        hasher.finish()
    })
    .unwrap();

    let mut model: Vec<(u64, u64)> = Vec::new();
    let mut rng = rand::thread_rng();

    for _ in 0..500 {
        if model.is_empty() || rng.gen_bool(0.7) {
            let key = rng.gen_range(0..20u64);
            let value = rng.gen_range(0..10u64);
            let expect = !model.contains(&(key, value));
            assert_eq!(table.insert(&key, &value).unwrap(), expect);
            if expect {
                model.push((key, value));
            }
        } else {
            let &(key, value) = model.choose(&mut rng).unwrap();
            assert!(table.remove(&key, &value).unwrap());
            model.retain(|&pair| pair != (key, value));
        }
    }

    for key in 0..20u64 {
        let mut actual = table.get(&key).unwrap();
        let mut expected: Vec<u64> = model
            .iter()
            .filter(|&&(k, _)| k == key)
            .map(|&(_, v)| v)
            .collect();
        actual.sort_unstable();
        expected.sort_unstable();
        assert_eq!(actual, expected, "key {} mismatch", key);
    }
}
