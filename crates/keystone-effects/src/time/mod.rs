//! Time effect handlers

pub mod real;
pub mod simulated;

pub use real::RealTimeHandler;
pub use simulated::SimulatedTimeHandler;
