//! State - 1 配送ぶんのタスク状態
//!
//! # 状態遷移
//! ```text
//! Received ─▶ Decoded ─▶ Classified ─▶ Published ─▶ Acknowledged
//!    │           │            │
//!    │           └────────────┴─▶ Unacknowledged (ack しない → 接続を閉じた後に broker が再配送)
//!    └─▶ Dropped ─▶ Acknowledged                 (壊れた payload は ack して捨てる)
//! ```
//!
//! 部分成功の状態はない（分類は task 単位で all-or-nothing）。

/// TaskState は TaskService が 1 つの配送を処理する間の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Received,
    Decoded,
    Classified,
    Published,
    /// 終端（成功 / drop 後）
    Acknowledged,
    /// decode 失敗。ログを残して Acknowledged へ
    Dropped,
    /// 終端（失敗）。settle せずに手放した。ループはここで止まる
    Unacknowledged,
}

impl TaskState {
    /// 許可された遷移かどうか
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Received, Decoded)
                | (Received, Dropped)
                | (Decoded, Classified)
                | (Decoded, Unacknowledged)
                | (Classified, Published)
                | (Classified, Unacknowledged)
                | (Published, Acknowledged)
                | (Dropped, Acknowledged)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Acknowledged | TaskState::Unacknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use TaskState::*;

    #[test]
    fn happy_path_is_allowed() {
        let path = [Received, Decoded, Classified, Published, Acknowledged];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn dropped_still_reaches_acknowledged() {
        assert!(Received.can_transition_to(Dropped));
        assert!(Dropped.can_transition_to(Acknowledged));
    }

    #[rstest]
    #[case::ack_before_publish(Classified, Acknowledged)]
    #[case::ack_before_classify(Decoded, Acknowledged)]
    #[case::ack_on_receipt(Received, Acknowledged)]
    #[case::unack_after_publish(Published, Unacknowledged)]
    #[case::unack_malformed(Dropped, Unacknowledged)]
    #[case::leave_terminal(Acknowledged, Received)]
    fn shortcuts_are_rejected(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn terminal_states() {
        assert!(Acknowledged.is_terminal());
        assert!(Unacknowledged.is_terminal());
        assert!(!Dropped.is_terminal());
        assert!(!Published.is_terminal());
    }
}
