//! Analysis-ready US federal data.
//!
//! `fedata` downloads the raw tabular datasets a few federal agencies
//! publish and consolidates each into a single flat `data.csv`:
//! reference (lookup) tables are loaded once, the large fact table is
//! streamed in bounded fragments, and every fragment is enriched by
//! left-outer joins, coerced to the dataset's declared column types
//! and appended to the output.

pub mod config;
pub mod consolidate;
pub mod convert;
pub mod download;
pub mod error;
pub mod frame;
pub mod join;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod schema;

pub use error::{FdError, Result};
