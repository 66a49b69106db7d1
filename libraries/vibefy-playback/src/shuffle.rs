//! Shuffle selection
//!
//! Shuffle here is uniform random selection over the whole queue on every
//! advance. There is no anti-repeat window: the track that just played can be
//! picked again.

use rand::{thread_rng, Rng};

/// Pick an index in `[0, len)` uniformly
///
/// `len` must be non-zero.
pub fn random_index(len: usize) -> usize {
    debug_assert!(len > 0, "random_index on an empty queue");
    thread_rng().gen_range(0..len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn single_track_always_zero() {
        for _ in 0..50 {
            assert_eq!(random_index(1), 0);
        }
    }

    #[test]
    fn covers_every_index() {
        // 5 slots, 1000 draws: missing one has probability ~5 * 0.8^1000
        let seen: HashSet<usize> = (0..1000).map(|_| random_index(5)).collect();
        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|&i| i < 5));
    }
}
