use thiserror::Error;

/// Failures of the durable store.
///
/// Expected outcomes (already claimed, unknown user, already registered)
/// are NOT errors; they are enum variants on the operation results. A
/// `StoreError` means the mutation may not have happened at all, and every
/// caller must surface it rather than fall back to a default value.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}
