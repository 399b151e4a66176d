#![no_main]

use libfuzzer_sys::fuzz_target;
use hotset::ds::ScoreHeap;

// Fuzz arbitrary operation sequences on ScoreHeap
//
// Tests random sequences of push, update, remove, pop_worst, sample_weak and
// rescore_all, checking the heap invariants after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let seed = u64::from_le_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]);
    let mut heap: ScoreHeap<u8, u16> =
        ScoreHeap::with_accounting(|v: &u16| usize::from(*v % 64), 16).with_seed(seed);

    let mut idx = 8;
    while idx + 2 < data.len() {
        let op = data[idx] % 7;
        let key = data[idx + 1] % 32;
        let score = u64::from(data[idx + 2] % 16);
        idx += 3;

        match op {
            0 => {
                let old_len = heap.len();
                let existed = heap.contains(&key);
                let pushed = heap.push(key, u16::from(data[idx - 1]), score);
                assert_eq!(pushed.is_err(), existed);
                if !existed {
                    assert_eq!(heap.len(), old_len + 1);
                    assert_eq!(heap.score_of(&key), Some(score));
                }
            },
            1 => {
                let existed = heap.contains(&key);
                assert_eq!(heap.update(&key, score), existed);
                if existed {
                    assert_eq!(heap.score_of(&key), Some(score));
                }
            },
            2 => {
                let old_len = heap.len();
                if heap.remove(&key).is_some() {
                    assert_eq!(heap.len(), old_len - 1);
                    assert!(!heap.contains(&key));
                }
            },
            3 => {
                let worst = heap.peek_worst().map(|(k, _, s)| (*k, s));
                let min = heap.keys().filter_map(|k| heap.score_of(k)).min();
                assert_eq!(worst.map(|(_, s)| s), min);
                if let Some((worst_key, _)) = worst {
                    let popped = heap.pop_worst().map(|(k, _)| k);
                    assert_eq!(popped, Some(worst_key));
                } else {
                    assert!(heap.is_empty());
                }
            },
            4 => {
                let min = heap.keys().filter_map(|k| heap.score_of(k)).min();
                let sampled = heap.sample_weak().map(|(_, _, s)| s);
                assert_eq!(sampled.is_some(), min.is_some());
                if let (Some(sampled), Some(min)) = (sampled, min) {
                    assert!(sampled >= min);
                }
            },
            5 => {
                let old_len = heap.len();
                heap.rescore_all(|_, entry| u64::from(*entry % 8));
                assert_eq!(heap.len(), old_len);
            },
            _ => {
                heap.clear();
                assert!(heap.is_empty());
                assert_eq!(heap.payload_bytes(), 0);
            },
        }

        if let Err(e) = heap.check_invariants() {
            panic!("{}", e);
        }
    }
});
