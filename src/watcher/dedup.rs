//! Time-windowed duplicate suppression for chat lines.
//!
//! A repeated (player, message) pair inside the window is dropped; entries
//! older than the window are pruned on every observation, so memory stays
//! bounded by recent chat volume. The clock is passed in as whole seconds
//! (the second-bucket), which keeps this testable without sleeping.

use std::collections::HashMap;

/// Bounded sliding-window set of recently seen chat lines.
pub struct SeenWindow {
    window_secs: u64,
    seen: HashMap<(String, String), u64>,
}

impl SeenWindow {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs,
            seen: HashMap::new(),
        }
    }

    /// Record a sighting of (player, message) at `now_secs`.
    ///
    /// Returns `true` when the line is fresh and should be processed,
    /// `false` when the same pair was already seen inside the window.
    pub fn observe(&mut self, player: &str, message: &str, now_secs: u64) -> bool {
        let window = self.window_secs;
        self.seen
            .retain(|_, &mut at| now_secs.saturating_sub(at) <= window);

        let key = (player.to_string(), message.to_string());
        if let Some(&at) = self.seen.get(&key) {
            if now_secs.saturating_sub(at) <= window {
                return false;
            }
        }
        self.seen.insert(key, now_secs);
        true
    }

    /// Number of entries currently tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_is_fresh() {
        let mut window = SeenWindow::new(5);
        assert!(window.observe("alice", "hello", 100));
    }

    #[test]
    fn test_repeat_within_window_dropped() {
        let mut window = SeenWindow::new(5);
        assert!(window.observe("alice", "hello", 100));
        assert!(!window.observe("alice", "hello", 100));
        assert!(!window.observe("alice", "hello", 103));
    }

    #[test]
    fn test_repeat_after_window_is_fresh() {
        let mut window = SeenWindow::new(5);
        assert!(window.observe("alice", "hello", 100));
        assert!(window.observe("alice", "hello", 106));
    }

    #[test]
    fn test_distinct_players_not_conflated() {
        let mut window = SeenWindow::new(5);
        assert!(window.observe("alice", "hello", 100));
        assert!(window.observe("bob", "hello", 100));
    }

    #[test]
    fn test_distinct_messages_not_conflated() {
        let mut window = SeenWindow::new(5);
        assert!(window.observe("alice", "hello", 100));
        assert!(window.observe("alice", "hello again", 100));
    }

    #[test]
    fn test_old_entries_pruned() {
        let mut window = SeenWindow::new(5);
        for i in 0..20 {
            window.observe("alice", &format!("msg {i}"), 100);
        }
        assert_eq!(window.len(), 20);
        // A much later observation prunes everything stale.
        window.observe("alice", "later", 200);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_zero_window_buckets_by_second() {
        let mut window = SeenWindow::new(0);
        assert!(window.observe("alice", "hello", 100));
        assert!(!window.observe("alice", "hello", 100));
        assert!(window.observe("alice", "hello", 101));
    }
}
