//! Junction Simulation Library
//!
//! A discrete-event simulation of trains competing for shared track at a
//! railway junction. Runs headless; see `src/main.rs` for the driver.

pub mod scenario;
pub mod simulation;
