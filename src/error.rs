//! Crate-wide error type.
//!
//! Every fallible operation in [`crate::chess`] returns [`Result<T>`]; parsing
//! and move-application failures are distinguished so callers can decide
//! whether a mistake is recoverable (bad user input) or a bug (an invariant
//! the position is supposed to uphold no longer holds).

use thiserror::Error as ThisError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while parsing or mutating a [`Position`](crate::chess::position::Position).
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A FEN, SAN/FAN, or square/piece token could not be parsed.
    #[error("failed to parse {token:?}: {message}{}", format_fen(fen))]
    Parse {
        /// Human-readable description of what was expected.
        message: String,
        /// The offending input fragment.
        token: String,
        /// FEN of the position being parsed, or the position SAN was being
        /// decoded against. Empty for token-level parsers (squares, pieces,
        /// ...) that have no position to attribute the error to yet; see
        /// [`Error::with_fen`].
        fen: String,
    },

    /// A move was rejected by [`Position::do_move`](crate::chess::position::Position::do_move)
    /// because it is not legal in the position it was played against.
    #[error("illegal move {mv} in position {fen}")]
    IllegalMove {
        /// UCI rendering of the rejected move.
        mv: String,
        /// FEN of the position the move was rejected in.
        fen: String,
    },

    /// An internal invariant that [`Position`](crate::chess::position::Position) is
    /// supposed to uphold unconditionally was violated. Seeing this means a
    /// bug in this crate, not bad input.
    #[error("invariant violated: {message}")]
    InvariantViolation {
        /// Description of the invariant that was found to be broken.
        message: String,
    },
}

/// Renders the `" (in position <fen>)"` suffix of [`Error::Parse`]'s message,
/// or nothing if no FEN was attached.
fn format_fen(fen: &str) -> String {
    if fen.is_empty() {
        String::new()
    } else {
        format!(" (in position {fen})")
    }
}

impl Error {
    /// Builds a [`Error::Parse`] from any displayable offending token, with
    /// no FEN attached yet. Low-level token parsers (squares, pieces, sides)
    /// have no position to attribute the error to; callers further up the
    /// stack that do attach one via [`Error::with_fen`].
    pub(crate) fn parse(message: impl Into<String>, token: impl ToString) -> Self {
        Self::Parse {
            message: message.into(),
            token: token.to_string(),
            fen: String::new(),
        }
    }

    /// Attaches `fen` to a [`Error::Parse`], overwriting any FEN already
    /// set. A no-op on every other variant.
    #[must_use]
    pub(crate) fn with_fen(self, fen: impl ToString) -> Self {
        match self {
            Self::Parse { message, token, .. } => Self::Parse {
                message,
                token,
                fen: fen.to_string(),
            },
            other => other,
        }
    }

    /// Builds a [`Error::IllegalMove`].
    pub(crate) fn illegal_move(mv: impl ToString, fen: impl ToString) -> Self {
        Self::IllegalMove {
            mv: mv.to_string(),
            fen: fen.to_string(),
        }
    }

    /// Builds a [`Error::InvariantViolation`].
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}
