pub mod aging;
pub mod battery;
pub mod degradation;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod fleet;
pub mod id;
pub mod simulation;
pub mod statistics;
pub mod steady_state;
