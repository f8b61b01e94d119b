//! Time-tag analysis math utilities.

pub mod math;

pub use math::stable::*;
pub use math::count_models::*;
pub use math::moments::*;
pub use math::propagation::*;
