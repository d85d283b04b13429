// Draft error taxonomy.

use thiserror::Error;

use crate::draft::sequence::Side;
use crate::hero::HeroId;

/// Errors surfaced synchronously by the draft state machine. A rejected
/// commit leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("draft is already finished")]
    InvalidState,

    #[error("hero {0} has already been banned or picked")]
    HeroUnavailable(HeroId),

    #[error("{side} has no open role for hero {hero}")]
    RoleExhausted { side: Side, hero: HeroId },

    #[error("hero {0} is not in the roster")]
    UnknownHero(HeroId),

    #[error("persisted action {index} does not match the draft order: expected {expected}, got {actual}")]
    SequenceMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
}
