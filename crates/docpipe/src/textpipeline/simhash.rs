//! 64-bit sim-hash for near-duplicate paragraph detection.
//!
//! Standard Charikar sim-hash: hash each token, accumulate signed per-bit
//! votes weighted by token frequency, then take the sign of each bit.

use std::collections::HashMap;

pub fn compute(text: &str) -> u64 {
    let mut weights: HashMap<&str, u32> = HashMap::new();
    for token in text.split_whitespace() {
        *weights.entry(token).or_insert(0) += 1;
    }

    let mut bit_votes = [0i64; 64];
    for (token, weight) in weights {
        let hash = token_hash(token);
        for (i, vote) in bit_votes.iter_mut().enumerate() {
            if hash & (1u64 << i) != 0 {
                *vote += weight as i64;
            } else {
                *vote -= weight as i64;
            }
        }
    }

    let mut result = 0u64;
    for (i, vote) in bit_votes.iter().enumerate() {
        if *vote > 0 {
            result |= 1u64 << i;
        }
    }
    result
}

pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

fn token_hash(token: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_zero_distance() {
        let a = compute("the quick brown fox jumps over the lazy dog");
        let b = compute("the quick brown fox jumps over the lazy dog");
        assert_eq!(hamming_distance(a, b), 0);
    }

    #[test]
    fn near_identical_text_has_small_distance() {
        let a = compute("the quick brown fox jumps over the lazy dog");
        let b = compute("the quick brown fox jumps over the lazy cat");
        assert!(hamming_distance(a, b) <= 16);
    }

    #[test]
    fn unrelated_text_has_larger_distance() {
        let a = compute("weather forecast for tomorrow shows heavy rain");
        let b = compute("quarterly revenue grew twelve percent year over year");
        assert!(hamming_distance(a, b) > 0);
    }
}
