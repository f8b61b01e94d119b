//! Core math modules.

pub mod stable;
pub mod count_models;
pub mod moments;
pub mod propagation;
