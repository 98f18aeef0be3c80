// Normalization pipeline: per-source normalizers, as-of truncation, source selection

pub mod processing;
pub mod selector;

pub use selector::{SelectorOptions, SourceSelector};
