#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use hotset::builder::TwoTierBuilder;
use hotset::policy::two_tier::{Tier, TwoTierCache};
use hotset::time::ManualClock;

// Fuzz arbitrary operation sequences on TwoTierCache
//
// The first bytes pick the configuration; the rest drive get, set, delete,
// invalidate, tick and clock movement. Invariants are checked after every
// operation.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let max_items = usize::from(data[0] % 16) + 1;
    let precision = usize::from(data[1] % 8) + 1;
    let mut builder = TwoTierBuilder::new()
        .max_items(max_items)
        .precision(precision)
        .cache_time(Duration::from_secs(10))
        .min_watched_items(usize::from(data[2] % 8))
        .seed(u64::from(data[3]));
    if data[2] & 0x80 != 0 {
        builder = builder.stale_time(Duration::from_secs(u64::from(data[2] % 30) + 1));
    }
    if data[3] & 0x80 != 0 {
        builder = builder.max_size(usize::from(data[3]) * 64 + 512);
    }

    let clock = ManualClock::new();
    let mut cache: TwoTierCache<u8, Vec<u8>, ManualClock> =
        match builder.try_build_with_clock(clock.clone()) {
            Ok(cache) => cache,
            Err(_) => return,
        };

    let mut idx = 4;
    while idx + 1 < data.len() {
        let op = data[idx] % 8;
        let key = data[idx + 1] % 48;
        idx += 2;

        match op {
            0 | 1 => {
                let hit = cache.get(&key);
                if hit.is_some() {
                    assert_eq!(cache.tier_of(&key), Some(Tier::Cached));
                }
            },
            2 | 3 => {
                let len = usize::from(key) * 3;
                cache.set(key, vec![key; len]);
            },
            4 => {
                cache.delete(&key);
                assert_eq!(cache.tier_of(&key), None);
            },
            5 => {
                cache.invalidate(&key);
                assert_ne!(cache.tier_of(&key), Some(Tier::Cached));
            },
            6 => {
                clock.advance(Duration::from_secs(u64::from(key)));
                cache.rotate_elapsed();
            },
            _ => {
                if key % 16 == 0 {
                    cache.invalidate_all();
                    assert_eq!(cache.size(), 0);
                } else {
                    cache.tick();
                }
            },
        }

        assert!(cache.size() <= max_items);
        if let Err(e) = cache.check_invariants() {
            panic!("{}", e);
        }
    }
});
