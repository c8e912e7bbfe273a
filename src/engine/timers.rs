use std::collections::BTreeMap;

/// Work a timer resumes when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Next character of the prompt being typed.
    TypeTick,
    /// Next iteration of the submission loop.
    NextPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Cancellable one-shot timers on a virtual millisecond clock.
///
/// Timers due at the same instant fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    // (deadline, sequence) -> task
    entries: BTreeMap<(u64, u64), Task>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Moves the clock forward. The clock never runs backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn schedule_after(&mut self, delay_ms: u64, task: Task) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.entries.insert((deadline, seq), task);
        TimerHandle(seq)
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self.entries.keys().find(|(_, seq)| *seq == handle.0).copied();
        match key {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the earliest timer due at or before `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, Task)> {
        let key = *self.entries.keys().next()?;
        if key.0 > until {
            return None;
        }
        self.entries.remove(&key).map(|task| (key.0, task))
    }
}
