//! Sentiment classes produced by the classifier.
//!
//! The mapping is fixed and total: the wire format only ever carries
//! 0 / 1 / 2. Anything else coming out of a model is a contract violation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sentiment class id.
///
/// Serialized as a bare integer (`0`, `1`, `2`) to match the stored record
/// shape `{"messageText": ..., "result": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClassId {
    Neutral = 0,
    Positive = 1,
    Negative = 2,
}

/// Raised when a raw value does not name one of the three classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("class id {0} is outside of {{0, 1, 2}}")]
pub struct InvalidClassId(pub i64);

impl ClassId {
    pub const ALL: [ClassId; 3] = [ClassId::Neutral, ClassId::Positive, ClassId::Negative];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case label used by the reporting side.
    pub fn label(self) -> &'static str {
        match self {
            ClassId::Neutral => "NEUTRAL",
            ClassId::Positive => "POSITIVE",
            ClassId::Negative => "NEGATIVE",
        }
    }
}

impl From<ClassId> for u8 {
    fn from(class: ClassId) -> Self {
        class.as_u8()
    }
}

impl TryFrom<u8> for ClassId {
    type Error = InvalidClassId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<i64> for ClassId {
    type Error = InvalidClassId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClassId::Neutral),
            1 => Ok(ClassId::Positive),
            2 => Ok(ClassId::Negative),
            other => Err(InvalidClassId(other)),
        }
    }
}

impl TryFrom<usize> for ClassId {
    type Error = InvalidClassId;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        Self::try_from(value)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
