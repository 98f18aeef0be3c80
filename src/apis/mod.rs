// Retrieval of raw feed tables
pub mod base;
pub mod csv_feed;
pub mod datastore;

pub use base::{HttpRecordSource, RecordSource};
