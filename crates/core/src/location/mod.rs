//! Location sample intake and distance-to-steps conversion.

mod distance;
mod tracker;

pub use distance::*;
pub use tracker::*;
