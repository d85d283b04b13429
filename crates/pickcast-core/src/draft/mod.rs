// Draft sequencing, availability bookkeeping and the state machine.

pub mod availability;
pub mod sequence;
pub mod state;
