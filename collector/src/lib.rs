//! Window layout, frame synthesis and per-window row accumulation for the
//! VNIR row collector test vectors.

pub mod accumulate;
pub mod error;
pub mod frames;
pub mod window;

pub use accumulate::{Accumulation, Accumulator, Reduction, averages, collect, floor_mean};
pub use error::CollectError;
pub use frames::Sampler;
pub use window::{RowLocation, Window, WindowLayout};
