//! Normalizes Israeli case-count feeds into one `(region, date)` panel with
//! as-of truncation for backtesting.

pub mod apis;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod export;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

// Layered boundaries for application ports and infrastructure adapters
pub mod app;
pub mod infra;

pub use domain::{CanonicalPanel, Observation, PanelKey, PanelRow};
pub use error::{PanelError, Result};
pub use pipeline::{SelectorOptions, SourceSelector};
pub use types::{RawRecordTable, SourceKind};
