// ABOUTME: Single-assignment result cell used to decide which encoding strategy wins
// ABOUTME: The first contender to settle keeps its value; later contenders get theirs back

use std::sync::OnceLock;

/// A slot that can be filled exactly once.
///
/// Several paths (worker completion, worker failure, deadline) race to settle
/// an ingestion job. `settle` is an atomic check-and-set: the first caller
/// wins, every later caller is handed its value back and must discard it.
#[derive(Debug)]
pub struct Settlement<T> {
    slot: OnceLock<T>,
}

impl<T> Settlement<T> {
    pub fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Try to fill the slot. Returns the rejected value if it was already settled.
    pub fn settle(&self, value: T) -> Result<(), T> {
        self.slot.set(value)
    }

    pub fn is_settled(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.slot.get()
    }

    pub fn into_inner(self) -> Option<T> {
        self.slot.into_inner()
    }
}

impl<T> Default for Settlement<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_settle_wins() {
        let cell = Settlement::new();
        assert!(!cell.is_settled());

        assert!(cell.settle("worker").is_ok());
        assert_eq!(cell.settle("deadline"), Err("deadline"));
        assert_eq!(cell.settle("error"), Err("error"));

        assert!(cell.is_settled());
        assert_eq!(cell.get(), Some(&"worker"));
        assert_eq!(cell.into_inner(), Some("worker"));
    }

    #[test]
    fn test_unsettled_cell_is_empty() {
        let cell: Settlement<u32> = Settlement::default();
        assert_eq!(cell.get(), None);
        assert_eq!(cell.into_inner(), None);
    }

    #[test]
    fn test_concurrent_contenders_settle_once() {
        let cell = Arc::new(Settlement::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.settle(i).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert!(cell.get().is_some());
    }
}
