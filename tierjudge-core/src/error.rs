use thiserror::Error;

/// Rejected vote. The ledger is left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("winner \"{winner}\" is neither \"{a}\" nor \"{b}\"")]
    WinnerNotInPair { a: String, b: String, winner: String },

    #[error("an item cannot be compared against itself: \"{0}\"")]
    SelfComparison(String),
}
