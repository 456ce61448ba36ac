//! Collision-rate acceptance tests: large key populations, statistical
//! margins. Thresholds allow 3x the target rate, which random seeds cannot
//! realistically exceed at these sample sizes.

use crate::BloomFilter;

#[test]
fn false_positive_rate_is_reasonable() {
    let n = 10_000u64;
    let fpr = 0.01;
    let mut bf = BloomFilter::new(n as f64, fpr).unwrap();

    for i in 0..n {
        bf.add_by_hash(&i);
    }

    let test_count = 10_000u64;
    let mut false_positives = 0;
    for i in n..(n + test_count) {
        if bf.test_by_hash(&i) {
            false_positives += 1;
        }
    }

    let actual_fpr = false_positives as f64 / test_count as f64;
    assert!(
        actual_fpr < fpr * 3.0,
        "FPR too high: {:.4} (target {:.4})",
        actual_fpr,
        fpr
    );
}

#[test]
fn sequential_integers_rarely_collide() {
    // A million consecutive integers at a 1e-5 target: a handful of
    // add-time collisions at most, and never a false negative.
    let n = 1_000_000u64;
    let mut bf = BloomFilter::new(n as f64, 1e-5).unwrap();

    let mut collisions = 0;
    for i in 0..n {
        if bf.test_by_hash(&i) {
            collisions += 1;
        } else {
            bf.add_by_hash(&i);
        }
    }
    assert!(collisions <= 10, "too many add-time collisions: {}", collisions);

    for i in 0..n {
        assert!(bf.test_by_hash(&i), "false negative for key {}", i);
    }
}

#[test]
fn word_vocabulary_collision_rates() {
    // 100k distinct "words" loaded at a 1e-4 target, then probed with a
    // set that overlaps in its last 10k entries.
    let fpr = 1e-4;
    let mut bf = BloomFilter::new(100_000.0, fpr).unwrap();

    let vocabulary: Vec<String> = (0..100_000).map(|i| format!("w{:06x}", i)).collect();
    let mut setup_collisions = 0;
    for word in &vocabulary {
        if bf.test_by_hash(word) {
            setup_collisions += 1;
        } else {
            bf.add_by_hash(word);
        }
    }
    assert!(
        setup_collisions < 10,
        "too many setup collisions: {}",
        setup_collisions
    );

    // Known members: zero false negatives, deterministically.
    for word in &vocabulary[90_000..] {
        assert!(bf.test_by_hash(word), "false negative for {}", word);
    }

    // Disjoint probes: false positives bounded by 3x the target rate.
    let probe_count = 90_000;
    let mut false_positives = 0;
    for i in 0..probe_count {
        if bf.test_by_hash(&format!("t{:06x}", i)) {
            false_positives += 1;
        }
    }
    let actual_fpr = false_positives as f64 / probe_count as f64;
    assert!(
        actual_fpr < fpr * 3.0,
        "FPR too high: {:.6} (target {:.6})",
        actual_fpr,
        fpr
    );
}
