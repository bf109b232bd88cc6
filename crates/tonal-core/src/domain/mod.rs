//! Domain model (task, class ids, codec, states, errors).
//!
//! このモジュールは queue / store / model の実装を一切知りません。

pub mod codec;
pub mod errors;
pub mod ids;
pub mod sentiment;
pub mod state;
pub mod task;

pub use self::errors::{InferenceError, MalformedTaskError, QueueError, StoreError};
pub use self::ids::WorkerIdentity;
pub use self::sentiment::{ClassId, InvalidClassId};
pub use self::state::TaskState;
pub use self::task::{Message, Task};
