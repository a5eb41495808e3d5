use std::time::Instant;

/// Handle to a scheduled timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<K> {
    id: TimerId,
    due: Instant,
    kind: K,
}

/// Cancellable one-shot timers. Nothing fires on its own: the owner asks for
/// due timers with [`Timers::pop_due`] and sleeps until [`Timers::next_due`].
#[derive(Debug)]
pub struct Timers<K> {
    next_id: u64,
    pending: Vec<Pending<K>>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self { next_id: 0, pending: Vec::new() }
    }
}

impl<K: Copy + Ord> Timers<K> {
    pub fn schedule(&mut self, due: Instant, kind: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, due, kind });
        id
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Remove and return the earliest timer due at or before `now`. Ties on
    /// the deadline go to the smaller kind, then to the older timer.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, Instant, K)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= now)
            .min_by_key(|(_, p)| (p.due, p.kind, p.id))
            .map(|(idx, _)| idx)?;
        let p = self.pending.swap_remove(idx);
        Some((p.id, p.due, p.kind))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
