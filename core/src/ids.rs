//! Primary key generation

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh primary keys
pub trait IdGenerator: Send + Sync {
    /// Produce a key that has not been handed out before
    fn next_id(&self) -> String;
}

/// UUIDv7 keys; their string order follows creation time
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeOrderedIds;

impl IdGenerator for TimeOrderedIds {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Predictable keys of the form `<prefix><n>`, starting at 1
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    /// Create a generator whose first key is `<prefix>1`
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIds {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("p");
        assert_eq!(ids.next_id(), "p1");
        assert_eq!(ids.next_id(), "p2");
        assert_eq!(ids.next_id(), "p3");
    }

    #[test]
    fn test_time_ordered_ids_are_unique() {
        let ids = TimeOrderedIds;
        let generated: Vec<String> = (0..100).map(|_| ids.next_id()).collect();

        let unique: HashSet<&String> = generated.iter().collect();
        assert_eq!(unique.len(), generated.len());
        assert!(generated.iter().all(|id| Uuid::parse_str(id).unwrap().get_version_num() == 7));
    }
}
