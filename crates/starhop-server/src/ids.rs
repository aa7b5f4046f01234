//! Random numeric identifiers for rooms and players.

use std::collections::HashSet;

use rand::Rng;

/// Digits in every room and user id.
pub const ID_LEN: usize = 8;

/// Hands out 8-digit ids that are unique among the ids currently live.
#[derive(Debug, Default)]
pub struct IdRegistry {
    live: HashSet<String>,
}

impl IdRegistry {
    /// Draw uniformly random ids until one is not live, then reserve it.
    pub fn allocate(&mut self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();
            if self.live.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Returns the id to the pool. False if it was not live.
    pub fn release(&mut self, id: &str) -> bool {
        self.live.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_eight_digits_and_unique() {
        let mut registry = IdRegistry::default();
        let ids: HashSet<String> = (0..500).map(|_| registry.allocate()).collect();
        assert_eq!(ids.len(), 500);
        for id in &ids {
            assert!(registry.contains(id));
            assert_eq!(id.len(), ID_LEN);
            assert!(id.bytes().all(|b| b.is_ascii_digit()), "{id}");
        }
    }

    #[test]
    fn release_frees_id() {
        let mut registry = IdRegistry::default();
        let id = registry.allocate();
        assert!(registry.contains(&id));
        assert!(registry.release(&id));
        assert!(!registry.release(&id));
        assert!(!registry.contains(&id));
    }
}
