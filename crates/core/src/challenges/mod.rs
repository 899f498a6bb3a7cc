//! Challenge domain models, step accounting, and the progression engine.

mod accumulator;
mod model;
mod progression;

pub use model::*;
pub use progression::*;
