use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::InferenceError;
use super::sentiment::ClassId;

/// One text item inside a task.
///
/// Fields the producer attaches besides `messageText` (e.g. `userID`,
/// `submitDate`) are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "messageText")]
    pub message_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassId>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(message_text: impl Into<String>) -> Self {
        Self {
            message_text: message_text.into(),
            result: None,
            extra: Map::new(),
        }
    }
}

/// A unit of work: an opaque caller-assigned id plus the ordered messages to
/// classify. The id doubles as the result store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    pub messages: Vec<Message>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            messages,
            extra: Map::new(),
        }
    }

    /// Owned copies of the message texts, in order (handed to the blocking pool).
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|m| m.message_text.clone())
            .collect()
    }

    /// Assign `results` to the messages by position.
    ///
    /// The whole task is rejected when the lengths differ; there is no
    /// partially classified task.
    pub fn annotate(mut self, results: Vec<ClassId>) -> Result<Self, InferenceError> {
        if results.len() != self.messages.len() {
            return Err(InferenceError::LengthMismatch {
                expected: self.messages.len(),
                actual: results.len(),
            });
        }
        for (message, class) in self.messages.iter_mut().zip(results) {
            message.result = Some(class);
        }
        Ok(self)
    }

    pub fn is_classified(&self) -> bool {
        self.messages.iter().all(|m| m.result.is_some())
    }

    /// Per-class message counts for the log line, e.g. `NEUTRAL=1 POSITIVE=0 NEGATIVE=2`.
    pub fn class_summary(&self) -> String {
        ClassId::ALL
            .iter()
            .map(|&class| {
                let count = self
                    .messages
                    .iter()
                    .filter(|m| m.result == Some(class))
                    .count();
                format!("{class}={count}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task::new(
            "t1",
            vec![Message::new("a"), Message::new("b"), Message::new("c")],
        )
    }

    #[test]
    fn annotate_is_positional() {
        let task = sample()
            .annotate(vec![ClassId::Negative, ClassId::Neutral, ClassId::Positive])
            .unwrap();

        let got: Vec<_> = task
            .messages
            .iter()
            .map(|m| (m.message_text.as_str(), m.result))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a", Some(ClassId::Negative)),
                ("b", Some(ClassId::Neutral)),
                ("c", Some(ClassId::Positive)),
            ]
        );
        assert!(task.is_classified());
    }

    #[test]
    fn annotate_rejects_short_results() {
        let err = sample().annotate(vec![ClassId::Neutral]).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::LengthMismatch { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn empty_task_is_trivially_classified() {
        let task = Task::new("empty", vec![]).annotate(vec![]).unwrap();
        assert!(task.messages.is_empty());
        assert!(task.is_classified());
    }

    #[test]
    fn texts_keep_order() {
        assert_eq!(sample().texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn class_summary_counts_every_class() {
        let task = sample()
            .annotate(vec![ClassId::Negative, ClassId::Neutral, ClassId::Negative])
            .unwrap();
        assert_eq!(task.class_summary(), "NEUTRAL=1 POSITIVE=0 NEGATIVE=2");
    }
}
