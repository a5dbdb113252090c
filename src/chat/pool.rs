//! Candidate Pool
//!
//! Recency-ordered, bounded list of chat participants eligible to be drafted
//! into a battle. Re-recording a user moves them to the most recent end; the
//! oldest entry is evicted once the pool is full.

use std::collections::VecDeque;

use crate::combat::components::{GameRng, Subscriber};
use crate::combat::constants::CANDIDATE_POOL_CAPACITY;

#[derive(Debug, Clone)]
pub struct CandidatePool {
    entries: VecDeque<Subscriber>,
    capacity: usize,
}

impl Default for CandidatePool {
    fn default() -> Self {
        Self::with_capacity(CANDIDATE_POOL_CAPACITY)
    }
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Insert or refresh a participant, keyed by username.
    pub fn record(&mut self, participant: Subscriber) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|s| s.username == participant.username)
        {
            self.entries.remove(index);
        }
        self.entries.push_back(participant);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Up to `n` distinct participants, uniformly at random.
    pub fn sample(&self, n: usize, rng: &mut GameRng) -> Vec<Subscriber> {
        rng.sample_indices(self.entries.len(), n)
            .into_iter()
            .filter_map(|i| self.entries.get(i).cloned())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, username: &str) -> bool {
        let username = username.to_lowercase();
        self.entries.iter().any(|s| s.username == username)
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Subscriber> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_record_upserts_by_username() {
        let mut pool = CandidatePool::new();
        pool.record(Subscriber::new("alice"));
        pool.record(Subscriber::new("bob"));
        pool.record(Subscriber::new("Alice").with_display_name("Alice!"));

        assert_eq!(pool.count(), 2);
        let order: Vec<_> = pool.iter().map(|s| s.display_name.clone()).collect();
        assert_eq!(order, vec!["bob".to_string(), "Alice!".to_string()]);
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let mut pool = CandidatePool::with_capacity(3);
        for name in ["a", "b", "c", "d"] {
            pool.record(Subscriber::new(name));
        }
        assert_eq!(pool.count(), 3);
        assert!(!pool.contains("a"));
        assert!(pool.contains("d"));
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut pool = CandidatePool::new();
        for i in 0..60 {
            pool.record(Subscriber::new(format!("user{}", i)));
        }
        assert_eq!(pool.count(), 50);
        assert!(!pool.contains("user9"));
        assert!(pool.contains("user10"));
    }

    #[test]
    fn test_oversized_sample_returns_everything() {
        let mut pool = CandidatePool::new();
        pool.record(Subscriber::new("x"));
        pool.record(Subscriber::new("y"));

        let mut rng = GameRng::from_seed(4);
        let sample = pool.sample(5, &mut rng);
        assert_eq!(sample.len(), 2);
        let unique: HashSet<_> = sample.iter().map(|s| s.username.clone()).collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_sample_from_empty_pool() {
        let pool = CandidatePool::new();
        let mut rng = GameRng::from_seed(4);
        assert!(pool.sample(3, &mut rng).is_empty());
    }
}
