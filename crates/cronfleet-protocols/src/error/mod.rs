//! Error types for the cronfleet protocol layer.

mod bus;
mod catalog;
mod operation;
mod partition;

pub use bus::*;
pub use catalog::*;
pub use operation::*;
pub use partition::*;
