//! Loss functions for the temporal-difference update.

pub mod functions;

pub use functions::{HuberLoss, Loss};
