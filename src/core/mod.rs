pub mod error;
pub mod types;

pub use error::{Result, StoreError, StoreResult, SyncError};
pub use types::{ChangeAction, ChangeEvent, MutationOp};
