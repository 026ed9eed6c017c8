/// Fire-once timers keyed by a monotonic millisecond clock.
/// Payloads come back out of `drain_due` once their due time has passed.
#[derive(Debug)]
pub struct TimerQueue<T> {
    pending: Vec<Timer<T>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer<T> {
    pub due_ms: f64,
    pub payload: T,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_ms: f64, payload: T) {
        self.pending.push(Timer { due_ms, payload });
    }

    /// Remove and return every timer due at or before `now_ms`, earliest first
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<Timer<T>> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due_ms <= now_ms {
                due.push(self.pending.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due
    }

    pub fn pending(&self) -> impl Iterator<Item = &Timer<T>> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
