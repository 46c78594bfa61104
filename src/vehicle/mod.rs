//! Vehicle model: collision footprint and the route-following car

pub mod footprint;
pub mod car;

pub use footprint::*;
pub use car::*;
