// Frame sampler: turns the latest raster into an encoded frame payload.

pub mod compress;
pub mod frame_sampler;

pub use frame_sampler::{FrameSampler, Sample, SampleError};
