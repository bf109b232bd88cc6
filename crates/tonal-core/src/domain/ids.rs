//! Worker identity label.
//!
//! Task ids are opaque caller-assigned strings and stay plain `String`s; the
//! only identifier the worker owns is its own label, which is attached to
//! every tracing span for log correlation.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerIdentity(String);

impl WorkerIdentity {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// `worker-<pid>`, used when no label is configured.
    pub fn from_pid() -> Self {
        Self(format!("worker-{}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
