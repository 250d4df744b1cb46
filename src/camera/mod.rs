// Capture source: device acquisition and the live raster stream.

pub mod backend;
pub mod capture;
pub mod dummy;
pub mod error;
pub mod still;
pub mod types;
