//! Virtual-time timer queue.
//!
//! Every effect core keeps its pending callbacks here instead of calling
//! `setTimeout`/`requestAnimationFrame` directly. The host drives time forward with
//! `advance(now)` on the owning core, which pops due entries in deadline order.
//! Entries with the same deadline fire in scheduling order.

use std::collections::{BTreeMap, HashMap};

/// Milliseconds on the host clock (e.g. `performance.now()` truncated)
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    entries: BTreeMap<(Millis, u64), E>,
    deadlines: HashMap<u64, Millis>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn schedule(&mut self, at: Millis, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert((at, id), event);
        self.deadlines.insert(id, at);
        TimerId(id)
    }

    /// Cancel a pending timer. Returns its event, or `None` if it already fired.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let at = self.deadlines.remove(&id.0)?;
        self.entries.remove(&(at, id.0))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    /// Remove and return the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerId, Millis, E)> {
        let (&(at, id), _) = self.entries.first_key_value()?;
        if at > now {
            return None;
        }
        self.deadlines.remove(&id);
        let event = self.entries.remove(&(at, id))?;
        Some((TimerId(id), at, event))
    }

    /// Deadline of the earliest pending entry
    pub fn next_due(&self) -> Option<Millis> {
        self.entries.keys().next().map(|&(at, _)| at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        let deadlines = &mut self.deadlines;
        self.entries.retain(|&(_, id), event| {
            let kept = keep(event);
            if !kept {
                deadlines.remove(&id);
            }
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(30, "c");
        queue.schedule(10, "a");
        queue.schedule(10, "b");

        assert_eq!(queue.next_due(), Some(10));
        assert_eq!(queue.pop_due(5), None);

        let fired: Vec<&str> = std::iter::from_fn(|| queue.pop_due(30).map(|(_, _, e)| e)).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(10, 1);
        let b = queue.schedule(20, 2);

        assert_eq!(queue.cancel(a), Some(1));
        assert_eq!(queue.cancel(a), None);
        assert!(!queue.is_pending(a));
        assert!(queue.is_pending(b));
        assert_eq!(queue.len(), 1);

        let (id, at, event) = queue.pop_due(100).unwrap();
        assert_eq!((id, at, event), (b, 20, 2));
        assert_eq!(queue.cancel(b), None);
    }

    #[test]
    fn test_retain() {
        let mut queue = TimerQueue::new();
        let even = queue.schedule(1, 2);
        let odd = queue.schedule(2, 3);

        queue.retain(|e| e % 2 == 0);

        assert!(queue.is_pending(even));
        assert!(!queue.is_pending(odd));
        assert_eq!(queue.len(), 1);
    }
}
