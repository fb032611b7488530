// Stratus Job Platform - Domain Layer
//
// Bounded contexts:
// - clock: injected time source shared by the scaler loop and its rules
// - scaling: scale rules, decisions, usage snapshots and collaborator ports

pub mod clock;
pub mod scaling;

pub use clock::*;
pub use scaling::*;
