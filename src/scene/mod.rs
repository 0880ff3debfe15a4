//! The normalized scene model, its 9x9 grid, and the per-cell board view.

pub mod board;
pub mod grid;
pub mod model;
