pub mod normalizer;
pub mod sample;

pub use normalizer::{normalize, normalize_at};
pub use sample::{FetchError, SampleFetcher};
