// Library root: the draft engine with no I/O beyond reference-data loading.

pub mod data;
pub mod draft;
pub mod error;
pub mod hero;
pub mod recommend;
pub mod scoring;
pub mod simulation;

pub use draft::sequence::{ActionKind, DraftStepSpec, Side};
pub use draft::state::{DraftAction, DraftState, TimerConfig};
pub use error::DraftError;
pub use hero::{Hero, HeroId, HeroPool, Role, Tier};
