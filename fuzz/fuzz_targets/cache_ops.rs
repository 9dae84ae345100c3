#![no_main]

//! Drives the controller and both shared backends with the same byte-coded
//! operation stream and checks they stay in lockstep.

use libfuzzer_sys::fuzz_target;
use recall_core::config::Backend;
use recall_core::lru_cache::LruCache;
use recall_core::shared::{ConcurrentCache, SharedCache};

fuzz_target!(|data: &[u8]| {
    let Some((&cap_byte, ops)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap_byte % 16) + 1;

    let mut single = LruCache::new(capacity);
    let locked: SharedCache<u8, u8> = SharedCache::new(Backend::Locked, capacity);
    let split: SharedCache<u8, u8> = SharedCache::new(Backend::Split, capacity);

    for chunk in ops.chunks_exact(2) {
        let (op, key) = (chunk[0], chunk[1] % 32);
        match op % 6 {
            0 | 1 => {
                let expected = single.put(key, op);
                assert_eq!(locked.put(key, op), expected);
                assert_eq!(split.put(key, op), expected);
            }
            2 => {
                let expected = single.get(&key).copied();
                assert_eq!(locked.get(&key), expected);
                assert_eq!(split.get(&key), expected);
            }
            3 => {
                let expected = single.peek(&key).copied();
                assert_eq!(locked.peek(&key), expected);
                assert_eq!(split.peek(&key), expected);
            }
            4 => {
                let expected = single.remove(&key);
                assert_eq!(locked.remove(&key), expected);
                assert_eq!(split.remove(&key), expected);
            }
            _ => {
                if key == 0 {
                    single.clear();
                    locked.clear();
                    split.clear();
                } else {
                    let expected = single.contains(&key);
                    assert_eq!(locked.contains(&key), expected);
                    assert_eq!(split.contains(&key), expected);
                }
            }
        }

        assert!(single.len() <= capacity);
        let keys = single.keys();
        assert_eq!(locked.keys(), keys);
        assert_eq!(split.keys(), keys);
    }

    assert_eq!(locked.stats(), *single.stats());
    assert_eq!(split.stats(), *single.stats());
});
