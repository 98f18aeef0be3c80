// Pipeline processing: source normalization and as-of truncation

pub mod normalize;
pub mod truncate;

pub use truncate::truncate;
