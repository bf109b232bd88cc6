use crate::domain::state::TaskState;

/// Counters for one consume loop. Logged once when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub received: usize,
    pub acknowledged: usize,
    pub dropped: usize,
    pub unacknowledged: usize,
}

impl WorkerStats {
    /// Count a state a delivery has reached. Only states that matter for
    /// reporting move a counter.
    pub fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Received => self.received += 1,
            TaskState::Acknowledged => self.acknowledged += 1,
            TaskState::Dropped => self.dropped += 1,
            TaskState::Unacknowledged => self.unacknowledged += 1,
            TaskState::Decoded | TaskState::Classified | TaskState::Published => {}
        }
    }
}
