use crate::models::CardInteractionState;

/// Errors surfaced by the data core.
///
/// None of these are fatal: page loads are retryable by the caller, seed
/// failures leave the store empty, and image fetch failures are rendered
/// as placeholders upstream.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,

    /// Wraps whatever failed while loading a page. The same page key may
    /// be requested again; nothing is retried automatically.
    #[error("page load failed: {0}")]
    PageLoad(#[source] Box<Error>),

    #[error("seed data rejected: {0}")]
    SeedData(String),

    #[error("image fetch failed: {0}")]
    ImageFetch(String),

    /// Card interactions are one-way: once confirmed or cancelled a card
    /// never moves to the other terminal state.
    #[error("invalid card transition: {from:?} -> {to:?}")]
    InvalidCardTransition {
        from: CardInteractionState,
        to: CardInteractionState,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
